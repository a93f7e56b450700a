//! Gemini API連携
//!
//! 画像（base64 JPEG）とプロンプトを generateContent に送り、
//! レスポンス本文のテキストを返す。パースは正規化側で行う。

use crate::error::{CropError, Result};
use base64::Engine;
use insta_crop_common::build_analysis_prompt;
use serde::{Deserialize, Serialize};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

fn build_request(jpeg: &[u8]) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: build_analysis_prompt() },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: "image/jpeg".to_string(),
                        data: base64::engine::general_purpose::STANDARD.encode(jpeg),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            response_mime_type: "application/json".to_string(),
        },
    }
}

fn endpoint(model: &str) -> String {
    format!("{}/{}:generateContent", GEMINI_API_BASE, model)
}

/// 先頭候補のテキストを連結して返す
fn response_text(response: GeminiResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CropError::ApiParse("Geminiのレスポンスが空です".into()));
    }
    Ok(text)
}

pub async fn generate(api_key: &str, model: &str, jpeg: &[u8]) -> Result<String> {
    let request = build_request(jpeg);

    let client = reqwest::Client::new();
    let response = client
        .post(endpoint(model))
        .header("x-goog-api-key", api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| CropError::ApiCall(format!("Gemini API呼び出しエラー: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(300).collect();
        return Err(CropError::ApiCall(format!("Gemini API error {}: {}", status, preview)));
    }

    let payload: GeminiResponse = response
        .json()
        .await
        .map_err(|e| CropError::ApiParse(format!("Geminiレスポンスのパースエラー: {}", e)))?;

    let text = response_text(payload)?;
    tracing::debug!(chars = text.len(), "Geminiレスポンス受信");
    Ok(text)
}
