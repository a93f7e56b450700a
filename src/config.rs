use crate::error::{CropError, Result};
use insta_crop_common::types::INSTAGRAM_SQUARE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    /// 解析用アップロード画像の長辺上限
    pub max_upload_size: u32,
    pub upload_jpeg_quality: u8,
    pub output_size: u32,
    pub jpeg_quality: u8,
    pub analysis_timeout_seconds: u64,
    pub fetch_timeout_seconds: u64,
    pub default_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            max_upload_size: 1568,
            upload_jpeg_quality: 85,
            output_size: INSTAGRAM_SQUARE,
            jpeg_quality: 95,
            analysis_timeout_seconds: 60,
            fetch_timeout_seconds: 30,
            default_batch_size: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CropError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("insta-crop").join("config.json"))
    }

    /// APIキーを解決（引数 > 環境変数 > 設定ファイル）
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
            return Ok(key.to_string());
        }

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key.clone().ok_or(CropError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.output_size, 1080);
        assert_eq!(config.jpeg_quality, 95);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "gemini-2.0-flash"}"#).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.analysis_timeout_seconds, 60);
        assert_eq!(config.default_batch_size, 4);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = Config {
            api_key: Some("from-file".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key(Some("from-flag")).unwrap(), "from-flag");
    }
}
