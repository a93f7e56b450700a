//! 画像処理パイプライン
//!
//! 読み込み → AI解析（またはキャッシュ） → 正規化 → 切り抜き計画 → 描画 → JPEG → 保存
//!
//! 解析結果と切り抜き領域は戻り値（ProcessReport）として返し、
//! 処理間で共有する状態は持たない。

use crate::analyzer::{analyze_image, AnalyzerSettings, CacheFile};
use crate::config::Config;
use crate::error::{CropError, Result};
use crate::loader::{load_image, load_local, LoadedImage};
use crate::output::{resolve_output_path, save_output};
use crate::render::{encode_jpeg, render};
use crate::scanner::{scan_folder, ImageInfo};
use indicatif::{ProgressBar, ProgressStyle};
use insta_crop_common::{
    normalize, plan_crop, CanonicalAnalysis, CropPlan, CropRectangle, Dimensions, RawAnalysis,
    SemanticAnalysis, Side, SideRule, TargetSize,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// 1枚分の処理結果（保存前）
#[derive(Debug, Clone)]
pub struct CropOutput {
    pub analysis: CanonicalAnalysis,
    pub plan: CropPlan,
    pub jpeg: Vec<u8>,
}

/// 処理オプション
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// 出力ファイルまたはディレクトリ（省略時はカレントに既定名）
    pub output: Option<PathBuf>,
    pub target: TargetSize,
    pub jpeg_quality: u8,
    pub fetch_timeout: Duration,
    /// キャッシュを置くディレクトリ（Noneならキャッシュを使わない）
    pub cache_dir: Option<PathBuf>,
}

impl ProcessOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            output: None,
            target: TargetSize::square(config.output_size)?,
            jpeg_quality: config.jpeg_quality,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_seconds),
            cache_dir: None,
        })
    }
}

/// 利用者に返す処理レポート
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub success: bool,
    pub message: String,
    pub source: String,
    pub source_dimensions: Dimensions,
    pub analysis: SemanticAnalysis,
    pub analysis_available: bool,
    pub analysis_note: Option<String>,
    pub crop_coordinates: CropRectangle,
    pub effective_side: Side,
    pub rule: SideRule,
    pub rule_description: String,
    pub output_size: TargetSize,
    pub output_file: Option<String>,
    /// 秒（小数2桁）。バッチでは画像ごとのデコード・解析・描画・保存の合計
    pub processing_time: f64,
}

impl ProcessReport {
    pub fn new(
        loaded: &LoadedImage,
        output: &CropOutput,
        target: TargetSize,
        output_file: Option<&Path>,
        elapsed: Duration,
    ) -> Self {
        let analysis_note = output.analysis.unavailable_note();
        let message = match &analysis_note {
            None => "画像を処理しました".to_string(),
            Some(_) => "画像を処理しました（AI解析なし）".to_string(),
        };

        Self {
            success: true,
            message,
            source: loaded.source.clone(),
            source_dimensions: loaded.dimensions,
            analysis: output.analysis.analysis.clone(),
            analysis_available: output.analysis.is_available(),
            analysis_note,
            crop_coordinates: output.plan.rectangle,
            effective_side: output.plan.effective_side,
            rule: output.plan.rule,
            rule_description: output.plan.rule.description().to_string(),
            output_size: target,
            output_file: output_file.map(|p| p.display().to_string()),
            processing_time: (elapsed.as_secs_f64() * 100.0).round() / 100.0,
        }
    }
}

/// 解析のみのレポート（描画しない）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub source: String,
    pub source_dimensions: Dimensions,
    pub analysis: CanonicalAnalysis,
    pub plan: CropPlan,
}

/// 正規化済み解析で切り抜き・描画・エンコードする
pub fn crop_with_analysis(
    loaded: &LoadedImage,
    analysis: CanonicalAnalysis,
    target: TargetSize,
    jpeg_quality: u8,
) -> Result<CropOutput> {
    let plan = plan_crop(loaded.dimensions, &analysis.analysis);
    let rendered = render(&loaded.image, plan.rectangle, target)?;
    let jpeg = encode_jpeg(&rendered, jpeg_quality)?;

    Ok(CropOutput { analysis, plan, jpeg })
}

/// AI呼び出しの生の結果から1枚を処理する
pub fn process_loaded(
    loaded: &LoadedImage,
    raw: RawAnalysis,
    target: TargetSize,
    jpeg_quality: u8,
) -> Result<CropOutput> {
    crop_with_analysis(loaded, normalize(raw), target, jpeg_quality)
}

/// キャッシュがあれば使い、なければAIに問い合わせる
async fn acquire_analysis(
    loaded: &LoadedImage,
    settings: &AnalyzerSettings,
    cache: Option<&mut CacheFile>,
) -> CanonicalAnalysis {
    match cache {
        Some(cache) => {
            let identity = settings.cache_identity();
            if let Some(cached) = cache.get(&loaded.content_id, identity) {
                tracing::info!(source = %loaded.source, "キャッシュされた解析を使用");
                return cached;
            }
            let analysis = analyze_image(&loaded.image, settings).await;
            cache.insert(loaded.content_id.clone(), loaded.source.clone(), identity, &analysis);
            analysis
        }
        None => analyze_image(&loaded.image, settings).await,
    }
}

fn save_cache(cache: Option<&CacheFile>, dir: Option<&Path>) {
    if let (Some(cache), Some(dir)) = (cache, dir) {
        if let Err(e) = cache.save(dir) {
            tracing::warn!(error = %e, "キャッシュを保存できませんでした");
        }
    }
}

/// 1枚を処理して保存する
pub async fn process_source(
    source: &str,
    settings: &AnalyzerSettings,
    options: &ProcessOptions,
) -> Result<ProcessReport> {
    let started = Instant::now();
    let loaded = load_image(source, options.fetch_timeout).await?;

    let mut cache = options.cache_dir.as_deref().map(CacheFile::load);
    let analysis = acquire_analysis(&loaded, settings, cache.as_mut()).await;
    save_cache(cache.as_ref(), options.cache_dir.as_deref());

    let output_path = resolve_output_path(options.output.as_deref(), &loaded.content_id);
    let (target, quality) = (options.target, options.jpeg_quality);

    let (loaded, output) = tokio::task::spawn_blocking(move || {
        let output = crop_with_analysis(&loaded, analysis, target, quality);
        (loaded, output)
    })
    .await
    .map_err(|e| CropError::Task(e.to_string()))?;
    let output = output?;

    save_output(&output_path, &output.jpeg)?;

    Ok(ProcessReport::new(
        &loaded,
        &output,
        target,
        Some(&output_path),
        started.elapsed(),
    ))
}

/// 解析と切り抜き計画のみ（描画・保存しない）
pub async fn analyze_source(
    source: &str,
    settings: &AnalyzerSettings,
    options: &ProcessOptions,
) -> Result<AnalysisReport> {
    let loaded = load_image(source, options.fetch_timeout).await?;

    let mut cache = options.cache_dir.as_deref().map(CacheFile::load);
    let analysis = acquire_analysis(&loaded, settings, cache.as_mut()).await;
    save_cache(cache.as_ref(), options.cache_dir.as_deref());

    let plan = plan_crop(loaded.dimensions, &analysis.analysis);

    Ok(AnalysisReport {
        source: loaded.source,
        source_dimensions: loaded.dimensions,
        analysis,
        plan,
    })
}

// =============================================
// バッチ処理
// =============================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub file_name: String,
    pub success: bool,
    pub message: String,
    pub report: Option<ProcessReport>,
}

impl BatchEntry {
    fn succeeded(info: &ImageInfo, report: ProcessReport) -> Self {
        Self {
            file_name: info.file_name.clone(),
            success: true,
            message: report.message.clone(),
            report: Some(report),
        }
    }

    fn failed(info: &ImageInfo, error: &CropError) -> Self {
        tracing::error!(file = %info.file_name, %error, "画像の処理に失敗");
        Self {
            file_name: info.file_name.clone(),
            success: false,
            message: error.to_string(),
            report: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub folder: String,
    pub output_dir: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// AI解析が使えず中央切り抜きになった件数
    pub fallback_count: usize,
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    fn new(folder: &Path, output_dir: &Path, mut entries: Vec<BatchEntry>) -> Self {
        entries.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        let succeeded = entries.iter().filter(|e| e.success).count();
        let fallback_count = entries
            .iter()
            .filter_map(|e| e.report.as_ref())
            .filter(|r| !r.analysis_available)
            .count();

        Self {
            folder: folder.display().to_string(),
            output_dir: output_dir.display().to_string(),
            total: entries.len(),
            succeeded,
            failed: entries.len() - succeeded,
            fallback_count,
            entries,
        }
    }
}

/// バッチ出力のファイル名: 元の名前 + コンテンツID
pub fn batch_output_name(info: &ImageInfo, content_id: &str) -> String {
    let id: String = content_id.chars().take(8).collect();
    format!("{}_{}.jpg", info.stem(), id)
}

/// 処理にかかった時間を併せて返す
fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let started = Instant::now();
    let value = f();
    (value, started.elapsed())
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=> "));
    bar
}

/// フォルダ内の画像をまとめて処理する
///
/// バッチごとに、デコードと描画はrayonで並列、AI解析は順番に行う。
/// 1枚の失敗はバッチ全体を止めない。
pub async fn process_batch(
    folder: &Path,
    output_dir: &Path,
    batch_size: usize,
    settings: &AnalyzerSettings,
    options: &ProcessOptions,
) -> Result<BatchReport> {
    let images = scan_folder(folder)?;
    if images.is_empty() {
        return Err(CropError::NoImagesFound(folder.display().to_string()));
    }
    std::fs::create_dir_all(output_dir)?;

    let mut cache = options.cache_dir.as_deref().map(CacheFile::load);
    let (target, quality) = (options.target, options.jpeg_quality);
    let progress = progress_bar(images.len());
    let mut entries = Vec::with_capacity(images.len());

    for (batch_idx, chunk) in images.chunks(batch_size.max(1)).enumerate() {
        tracing::debug!(batch = batch_idx + 1, count = chunk.len(), "バッチ開始");

        // 1. 並列デコード
        let paths: Vec<PathBuf> = chunk.iter().map(|i| i.path.clone()).collect();
        let decoded: Vec<(Result<LoadedImage>, Duration)> = tokio::task::spawn_blocking(move || {
            paths.par_iter().map(|p| timed(|| load_local(p))).collect()
        })
        .await
        .map_err(|e| CropError::Task(e.to_string()))?;

        // 2. AI解析（順番に）
        let mut jobs = Vec::with_capacity(chunk.len());
        for (info, (result, decode_time)) in chunk.iter().zip(decoded) {
            match result {
                Ok(loaded) => {
                    progress.set_message(info.file_name.clone());
                    let started = Instant::now();
                    let analysis = acquire_analysis(&loaded, settings, cache.as_mut()).await;
                    let spent = decode_time + started.elapsed();
                    jobs.push((info.clone(), loaded, analysis, spent));
                }
                Err(e) => {
                    progress.inc(1);
                    entries.push(BatchEntry::failed(info, &e));
                }
            }
        }

        // 3. 並列描画・エンコード
        let rendered: Vec<(ImageInfo, LoadedImage, Result<CropOutput>, Duration)> =
            tokio::task::spawn_blocking(move || {
                jobs.into_par_iter()
                    .map(|(info, loaded, analysis, spent)| {
                        let (output, render_time) =
                            timed(|| crop_with_analysis(&loaded, analysis, target, quality));
                        (info, loaded, output, spent + render_time)
                    })
                    .collect()
            })
            .await
            .map_err(|e| CropError::Task(e.to_string()))?;

        // 4. 保存
        for (info, loaded, output, spent) in rendered {
            let saved = output.and_then(|output| {
                let path = output_dir.join(batch_output_name(&info, &loaded.content_id));
                let (written, save_time) = timed(|| save_output(&path, &output.jpeg));
                written?;
                Ok(ProcessReport::new(&loaded, &output, target, Some(&path), spent + save_time))
            });
            let entry = match saved {
                Ok(report) => BatchEntry::succeeded(&info, report),
                Err(e) => BatchEntry::failed(&info, &e),
            };
            progress.inc(1);
            entries.push(entry);
        }
    }

    progress.finish_and_clear();
    save_cache(cache.as_ref(), options.cache_dir.as_deref());

    Ok(BatchReport::new(folder, output_dir, entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_measures_only_the_closure() {
        let (value, spent) = timed(|| {
            std::thread::sleep(Duration::from_millis(20));
            42
        });
        assert_eq!(value, 42);
        assert!(spent >= Duration::from_millis(20));
        assert!(spent < Duration::from_secs(5));
    }

    #[test]
    fn test_batch_output_name() {
        let info = ImageInfo {
            path: PathBuf::from("/photos/before_after.png"),
            file_name: "before_after.png".to_string(),
        };
        assert_eq!(batch_output_name(&info, "0123456789abcdef"), "before_after_01234567.jpg");
    }
}
