use anyhow::Context;
use clap::Parser;
use insta_crop::ai_provider::AiProvider;
use insta_crop::analyzer::{AnalyzerSettings, CacheFile};
use insta_crop::{cli, config, logging, pipeline};
use insta_crop_common::{cropping_rules, TargetSize};
use cli::{Cli, Commands};
use config::Config;
use pipeline::ProcessOptions;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_json);

    if let Err(e) = run(cli).await {
        eprintln!("❌ エラー: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load().context("設定ファイルを読み込めません")?;

    match cli.command {
        Commands::Crop { source, output, size, report, use_cache } => {
            println!("📸 insta-crop - 切り抜き\n");

            let settings = analyzer_settings(&config, &cli.ai_provider, cli.api_key.as_deref());
            let mut options = process_options(&config, size)?;
            if use_cache {
                options.cache_dir = Some(cache_dir_for(output.as_deref()));
            }
            options.output = output;

            let result = pipeline::process_source(&source, &settings, &options).await?;

            if let Some(note) = &result.analysis_note {
                println!("⚠ {}", note);
            }
            println!("- 切り抜き領域: {} ({})", result.crop_coordinates, result.rule_description);
            println!("- 処理時間: {:.2}秒", result.processing_time);

            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&report_path, json)
                    .with_context(|| format!("レポートを書き込めません: {}", report_path.display()))?;
                println!("✔ レポートを保存: {}", report_path.display());
            }

            println!("\n✅ 画像を処理しました");
            if let Some(file) = &result.output_file {
                println!("📁 保存先: {}", file);
            }
        }

        Commands::Batch { folder, output, batch_size, size, use_cache, clear_cache } => {
            println!("🚀 insta-crop - 一括処理\n");

            let settings = analyzer_settings(&config, &cli.ai_provider, cli.api_key.as_deref());
            let output_dir = output.unwrap_or_else(|| folder.join("instagram"));
            let mut options = process_options(&config, size)?;
            if clear_cache && CacheFile::clear(&output_dir)? {
                println!("✔ キャッシュを削除しました");
            }
            if use_cache {
                options.cache_dir = Some(output_dir.clone());
            }
            let batch_size = batch_size.unwrap_or(config.default_batch_size);

            let report = pipeline::process_batch(&folder, &output_dir, batch_size, &settings, &options).await?;

            let report_path = output_dir.join("batch-report.json");
            std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)
                .with_context(|| format!("レポートを書き込めません: {}", report_path.display()))?;

            println!("✔ 成功: {}枚 / 失敗: {}枚 / AI解析なし: {}枚", report.succeeded, report.failed, report.fallback_count);
            for entry in report.entries.iter().filter(|e| !e.success) {
                println!("  ✖ {}: {}", entry.file_name, entry.message);
            }
            println!("✔ レポートを保存: {}", report_path.display());
            println!("\n✅ 完了: {}", output_dir.display());
        }

        Commands::Analyze { source } => {
            let settings = analyzer_settings(&config, &cli.ai_provider, cli.api_key.as_deref());
            let options = process_options(&config, None)?;

            let report = pipeline::analyze_source(&source, &settings, &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Rules => {
            let target = TargetSize::square(config.output_size)?;
            let rules = cropping_rules(target, config.jpeg_quality);
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  出力サイズ: {}px (JPEG品質 {})", config.output_size, config.jpeg_quality);
                println!("  解析用最大サイズ: {}px", config.max_upload_size);
                println!("  解析タイムアウト: {}秒", config.analysis_timeout_seconds);
                println!("  バッチサイズ: {}", config.default_batch_size);
                println!("  APIキー: {}", if config.resolve_api_key(None).is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

fn analyzer_settings(
    config: &Config,
    provider: &AiProvider,
    api_key: Option<&str>,
) -> AnalyzerSettings {
    let settings = AnalyzerSettings::from_config(config, *provider, api_key);
    // stdoutはanalyzeのJSON出力に使うため、注意文はstderrへ
    if let Some(notice) = settings.missing_key_notice() {
        eprintln!("{}", notice);
    }
    settings
}

fn process_options(config: &Config, size: Option<u32>) -> anyhow::Result<ProcessOptions> {
    let mut options = ProcessOptions::from_config(config)?;
    if let Some(size) = size {
        options.target = TargetSize::square(size)?;
    }
    Ok(options)
}

/// 単体処理のキャッシュ置き場: 出力ディレクトリ、なければカレント
fn cache_dir_for(output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => path.to_path_buf(),
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".")),
        None => PathBuf::from("."),
    }
}
