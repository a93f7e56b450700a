//! 画像の取得（URL or ローカルファイル）とデコード

use crate::error::{CropError, Result};
use image::DynamicImage;
use insta_crop_common::Dimensions;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

/// デコード済みの入力画像
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub source: String,
    pub image: DynamicImage,
    pub dimensions: Dimensions,
    /// 元データのSHA-256先頭8バイト（16進）
    pub content_id: String,
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// URLならダウンロード、それ以外はローカルファイルとして読み込む
pub async fn load_image(source: &str, fetch_timeout: Duration) -> Result<LoadedImage> {
    let bytes = if is_remote(source) {
        tracing::info!(url = source, "画像をダウンロード中");
        fetch_bytes(source, fetch_timeout).await?
    } else {
        tracing::info!(path = source, "ローカル画像を読み込み中");
        read_local_bytes(Path::new(source))?
    };

    decode_image(source, &bytes)
}

/// ローカルファイルを読み込む（同期版、バッチ処理用）
pub fn load_local(path: &Path) -> Result<LoadedImage> {
    let bytes = read_local_bytes(path)?;
    decode_image(&path.display().to_string(), &bytes)
}

pub fn decode_image(source: &str, bytes: &[u8]) -> Result<LoadedImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| CropError::ImageLoad(format!("{}: {}", source, e)))?;
    let dimensions = Dimensions::new(image.width(), image.height())?;

    tracing::info!(source, %dimensions, "画像を読み込みました");

    Ok(LoadedImage {
        source: source.to_string(),
        image,
        dimensions,
        content_id: content_id(bytes),
    })
}

/// 出力ファイル名・キャッシュキー用のコンテンツID
pub fn content_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..8])
}

fn read_local_bytes(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(CropError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read(path)?)
}

async fn fetch_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CropError::ImageFetch(format!("HTTPクライアント作成エラー: {}", e)))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            CropError::Timeout(format!("{} ({}秒)", url, timeout.as_secs()))
        } else {
            CropError::ImageFetch(format!("{}: {}", url, e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CropError::ImageFetch(format!("{}: HTTP {}", url, status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CropError::ImageFetch(format!("{}: {}", url, e)))?;

    tracing::debug!(url, size = bytes.len(), "ダウンロード完了");
    Ok(bytes.to_vec())
}
