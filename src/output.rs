//! 出力ファイル名の決定と保存

use crate::error::Result;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const OUTPUT_PREFIX: &str = "instagram_crop";

/// 既定の出力ファイル名: コンテンツID + タイムスタンプ
pub fn default_output_name(content_id: &str, now: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.jpg",
        OUTPUT_PREFIX,
        content_id,
        now.format("%Y%m%d%H%M%S")
    )
}

/// 出力先を決める。指定がディレクトリなら既定名をその中に作る
pub fn resolve_output_path(output: Option<&Path>, content_id: &str) -> PathBuf {
    let name = default_output_name(content_id, Local::now());
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => path.join(name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(name),
    }
}

/// JPEGを書き出す（親ディレクトリがなければ作成）
pub fn save_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), size = bytes.len(), "画像を保存しました");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_default_output_name() {
        let now = Local.with_ymd_and_hms(2025, 10, 3, 14, 5, 9).unwrap();
        assert_eq!(
            default_output_name("0123abcd4567ef89", now),
            "instagram_crop_0123abcd4567ef89_20251003140509.jpg"
        );
    }

    #[test]
    fn test_resolve_output_path_explicit_file() {
        let path = resolve_output_path(Some(Path::new("out/photo.jpg")), "abc");
        assert_eq!(path, PathBuf::from("out/photo.jpg"));
    }

    #[test]
    fn test_resolve_output_path_directory() {
        let dir = tempdir().unwrap();
        let path = resolve_output_path(Some(dir.path()), "abc");
        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("instagram_crop_abc_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_save_output_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jpg");
        save_output(&path, b"jpeg").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg");
    }
}
