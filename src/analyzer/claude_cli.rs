//! Claude CLI連携
//!
//! 解析用JPEGを一時ファイルに書き出し、そのパスをプロンプトに含めて
//! `claude -p` を実行する。

use crate::error::{CropError, Result};
use insta_crop_common::build_analysis_prompt;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub async fn analyze(jpeg: &[u8]) -> Result<String> {
    let temp_path = temp_image_path();
    std::fs::write(&temp_path, jpeg)?;

    let prompt = build_prompt(&temp_path);
    let result = run_claude_cli(&prompt).await;

    if let Err(e) = std::fs::remove_file(&temp_path) {
        tracing::debug!(path = %temp_path.display(), error = %e, "一時ファイルの削除に失敗");
    }

    result
}

fn temp_image_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%f");
    std::env::temp_dir().join(format!("insta-crop-{}-{}.jpg", std::process::id(), stamp))
}

fn build_prompt(image_path: &Path) -> String {
    let path = image_path.display().to_string().replace('\\', "/");
    let raw_prompt = format!(
        "Read the following image file and analyze it: {}\n\n{}",
        path,
        build_analysis_prompt()
    );
    // cmd経由で渡すため改行をスペースに置換
    raw_prompt.replace('\n', " ")
}

async fn run_claude_cli(prompt: &str) -> Result<String> {
    // Windowsではcmd /c経由
    #[cfg(windows)]
    let mut command = {
        let escaped = prompt.replace('"', "\\\"");
        let mut c = Command::new("cmd");
        c.args(["/c", "claude", "-p", &escaped, "--output-format", "text"]);
        c
    };

    #[cfg(not(windows))]
    let mut command = {
        let mut c = Command::new("claude");
        c.args(["-p", prompt, "--output-format", "text"]);
        c
    };

    let output = command
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| CropError::CliExecution(format!("Claude CLI実行エラー: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CropError::ApiCall(format!(
            "Claude CLI failed (code {:?}): {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    let response = String::from_utf8_lossy(&output.stdout).to_string();
    let preview: String = response.chars().take(500).collect();
    tracing::debug!(%preview, "Claude CLIレスポンス");

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_single_line_with_path() {
        let prompt = build_prompt(Path::new("/tmp/insta-crop-1.jpg"));
        assert!(prompt.starts_with("Read the following image file and analyze it: /tmp/insta-crop-1.jpg"));
        assert!(!prompt.contains('\n'));
        assert!(prompt.contains("\"importantSide\""));
    }

    #[test]
    fn test_temp_image_path_is_jpeg_in_temp_dir() {
        let path = temp_image_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }
}
