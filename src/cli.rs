use clap::{Parser, Subcommand};
use crate::ai_provider::AiProvider;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "insta-crop")]
#[command(about = "AI解析で写真をInstagram用の正方形に切り抜くツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ログをJSONで出力
    #[arg(long, global = true)]
    pub log_json: bool,

    /// AIプロバイダ (gemini/claude)
    #[arg(long, value_enum, default_value_t = AiProvider::Gemini, global = true)]
    pub ai_provider: AiProvider,

    /// Gemini APIキー（省略時は GEMINI_API_KEY → 設定ファイル）
    #[arg(short = 'k', long, global = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像1枚を解析して切り抜く
    Crop {
        /// 画像のURLまたはローカルパス
        #[arg(required = true)]
        source: String,

        /// 出力ファイル/ディレクトリ（デフォルト: instagram_crop_<id>_<日時>.jpg）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力サイズ（正方形の一辺px、デフォルトは設定値 1080）
        #[arg(short, long)]
        size: Option<u32>,

        /// 処理レポートのJSON出力先
        #[arg(long)]
        report: Option<PathBuf>,

        /// キャッシュを使用（同じ画像の再解析をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// フォルダ内の画像をまとめて切り抜く
    Batch {
        /// 写真フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力ディレクトリ（デフォルト: 入力フォルダ/instagram）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// バッチサイズ（一度に読み込む枚数）
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// 出力サイズ（正方形の一辺px）
        #[arg(short, long)]
        size: Option<u32>,

        /// キャッシュを使用（再解析をスキップ）
        #[arg(long)]
        use_cache: bool,

        /// 処理前にキャッシュを削除
        #[arg(long)]
        clear_cache: bool,
    },

    /// 解析結果と切り抜き領域のみ表示（画像は出力しない）
    Analyze {
        /// 画像のURLまたはローカルパス
        #[arg(required = true)]
        source: String,
    },

    /// 切り抜きルールを表示
    Rules,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crop_command() {
        let cli = Cli::parse_from([
            "insta-crop", "crop", "https://example.com/a.png", "-o", "out.jpg", "--size", "720",
        ]);
        match cli.command {
            Commands::Crop { source, output, size, use_cache, .. } => {
                assert_eq!(source, "https://example.com/a.png");
                assert_eq!(output, Some(PathBuf::from("out.jpg")));
                assert_eq!(size, Some(720));
                assert!(!use_cache);
            }
            _ => panic!("Expected crop command"),
        }
        assert_eq!(cli.ai_provider, AiProvider::Gemini);
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from([
            "insta-crop", "batch", "photos", "--ai-provider", "claude", "-v", "-k", "KEY",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.ai_provider, AiProvider::Claude);
        assert_eq!(cli.api_key.as_deref(), Some("KEY"));
        assert!(matches!(cli.command, Commands::Batch { .. }));
    }
}
