//! 解析結果の正規化
//!
//! 外部AI呼び出しの結果（成功レスポンス or 失敗）を受け取り、
//! 常に有効な SemanticAnalysis を返す。失敗はここで吸収し、
//! 呼び出し側にはエラーとして伝播させない。

use crate::parser::parse_analysis_response;
use crate::types::SemanticAnalysis;
use serde::{Deserialize, Serialize};

/// AI呼び出しの生の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAnalysis {
    /// AIが返したレスポンス本文
    Response(String),
    /// 呼び出し失敗（エラー、タイムアウト、APIキーなし等）
    Failed(String),
}

impl<E: std::fmt::Display> From<std::result::Result<String, E>> for RawAnalysis {
    fn from(result: std::result::Result<String, E>) -> Self {
        match result {
            Ok(text) => RawAnalysis::Response(text),
            Err(e) => RawAnalysis::Failed(e.to_string()),
        }
    }
}

/// 解析結果の出どころ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisSource {
    /// AIのレスポンスをパースできた
    Model,
    /// 既定レコードで代替した
    Fallback { reason: String },
}

/// 正規化済み解析（切り抜き計算の入力）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalAnalysis {
    pub analysis: SemanticAnalysis,
    pub source: AnalysisSource,
}

impl CanonicalAnalysis {
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            analysis: SemanticAnalysis::fallback(),
            source: AnalysisSource::Fallback { reason: reason.into() },
        }
    }

    /// AI解析が利用できたか
    pub fn is_available(&self) -> bool {
        matches!(self.source, AnalysisSource::Model)
    }

    /// 利用者向けの注記（解析が使えなかった場合のみ）
    pub fn unavailable_note(&self) -> Option<String> {
        match &self.source {
            AnalysisSource::Model => None,
            AnalysisSource::Fallback { reason } => Some(format!(
                "AI解析を利用できなかったため中央で切り抜きました ({})",
                reason
            )),
        }
    }
}

/// 生の結果を正規化する。失敗時は既定レコードを返す
pub fn normalize(raw: RawAnalysis) -> CanonicalAnalysis {
    match raw {
        RawAnalysis::Response(text) => match parse_analysis_response(&text) {
            Ok(analysis) => {
                tracing::debug!(?analysis, "解析レスポンスを正規化");
                CanonicalAnalysis {
                    analysis,
                    source: AnalysisSource::Model,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "解析レスポンスが不正なため既定値を使用");
                CanonicalAnalysis::fallback(e.to_string())
            }
        },
        RawAnalysis::Failed(reason) => {
            tracing::warn!(%reason, "AI解析に失敗したため既定値を使用");
            CanonicalAnalysis::fallback(reason)
        }
    }
}
