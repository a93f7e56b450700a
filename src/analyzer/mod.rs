pub mod cache;
mod claude_cli;
mod gemini;

use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::{CropError, Result};
use crate::render::prepare_upload;
use image::DynamicImage;
use insta_crop_common::{normalize, CanonicalAnalysis, RawAnalysis};
use std::future::Future;
use std::time::Duration;

pub use cache::CacheFile;

/// AI解析の呼び出し設定
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub provider: AiProvider,
    pub api_key: Option<String>,
    pub model: String,
    pub max_upload_size: u32,
    pub upload_jpeg_quality: u8,
    pub timeout: Duration,
}

impl AnalyzerSettings {
    /// キャッシュ照合用の識別子（プロバイダ, モデル）。Claude CLIはモデル指定を持たない
    pub fn cache_identity(&self) -> (&'static str, &str) {
        match self.provider {
            AiProvider::Gemini => (self.provider.display_name(), self.model.as_str()),
            AiProvider::Claude => (self.provider.display_name(), ""),
        }
    }

    /// APIキーが必要なのに未設定の場合の注意文
    pub fn missing_key_notice(&self) -> Option<&'static str> {
        if self.provider.requires_api_key() && self.api_key.is_none() {
            Some("⚠ APIキーが未設定のため、AI解析なしで中央切り抜きを行います")
        } else {
            None
        }
    }

    /// APIキーが解決できない場合も作成できる（解析時に既定値へフォールバック）
    pub fn from_config(config: &Config, provider: AiProvider, api_key: Option<&str>) -> Self {
        let api_key = if provider.requires_api_key() {
            config.resolve_api_key(api_key).ok()
        } else {
            None
        };

        Self {
            provider,
            api_key,
            model: config.model.clone(),
            max_upload_size: config.max_upload_size,
            upload_jpeg_quality: config.upload_jpeg_quality,
            timeout: Duration::from_secs(config.analysis_timeout_seconds),
        }
    }
}

/// AIに画像解析を依頼し、レスポンス本文を返す
///
/// 呼び出し全体にタイムアウトをかける。
pub async fn request_analysis(image: &DynamicImage, settings: &AnalyzerSettings) -> Result<String> {
    let upload = prepare_upload(image, settings.max_upload_size, settings.upload_jpeg_quality)?;
    tracing::info!(
        provider = settings.provider.display_name(),
        upload_bytes = upload.len(),
        "AI解析中..."
    );

    let call = async {
        match settings.provider {
            AiProvider::Gemini => match settings.api_key.as_deref() {
                Some(api_key) => gemini::generate(api_key, &settings.model, &upload).await,
                None => Err(CropError::MissingApiKey),
            },
            AiProvider::Claude => claude_cli::analyze(&upload).await,
        }
    };

    with_timeout(settings.timeout, call).await
}

/// AI呼び出しに時間制限をかける。時間切れは `CropError::Timeout`
pub async fn with_timeout<F>(limit: Duration, call: F) -> Result<String>
where
    F: Future<Output = Result<String>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CropError::Timeout(format!(
            "AI解析が{:.1}秒以内に完了しませんでした",
            limit.as_secs_f64()
        ))),
    }
}

/// 画像を解析して正規化済みの結果を返す。失敗しても既定値で返る
pub async fn analyze_image(image: &DynamicImage, settings: &AnalyzerSettings) -> CanonicalAnalysis {
    let raw = RawAnalysis::from(request_analysis(image, settings).await);
    let canonical = normalize(raw);
    if canonical.is_available() {
        tracing::info!("解析完了");
    }
    canonical
}
