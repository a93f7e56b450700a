//! 解析結果キャッシュモジュール
//!
//! 画像データのコンテンツIDをキーにして正規化済み解析をキャッシュし、
//! 同じ画像でのAI呼び出しをスキップする。AIから得た解析のみ保存する。
//! プロバイダ・モデルが異なるエントリはヒットしない。

use crate::error::Result;
use insta_crop_common::{AnalysisSource, CanonicalAnalysis, SemanticAnalysis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".insta-crop-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// コンテンツID → 解析結果
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 元画像（パスまたはURL）
    pub source: String,
    /// 解析したプロバイダ
    pub provider: String,
    /// 解析したモデル（Claude CLIは空）
    pub model: String,
    pub analysis: SemanticAnalysis,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 2;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（なし・破損・バージョン違いは空）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                tracing::warn!("キャッシュバージョン不一致、再生成します");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "キャッシュを読み込めないため無視します");
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, folder: &Path) -> Result<()> {
        std::fs::create_dir_all(folder)?;
        let file = File::create(Self::cache_path(folder))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// キャッシュファイルを削除。存在しなければ false
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// キャッシュをルックアップ。プロバイダかモデルが違えばミス
    pub fn get(&self, content_id: &str, (provider, model): (&str, &str)) -> Option<CanonicalAnalysis> {
        self.entries
            .get(content_id)
            .filter(|e| e.provider == provider && e.model == model)
            .map(|e| CanonicalAnalysis {
                analysis: e.analysis.clone(),
                source: AnalysisSource::Model,
            })
    }

    /// キャッシュに追加。既定値で代替した解析は保存しない
    pub fn insert(
        &mut self,
        content_id: String,
        source: String,
        (provider, model): (&str, &str),
        canonical: &CanonicalAnalysis,
    ) -> bool {
        if !canonical.is_available() {
            return false;
        }
        self.entries.insert(
            content_id,
            CacheEntry {
                source,
                provider: provider.to_string(),
                model: model.to_string(),
                analysis: canonical.analysis.clone(),
            },
        );
        true
    }

    /// キャッシュ件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}
