//! 切り抜き・リサイズ・JPEGエンコード
//!
//! 保存は行わない（output::save_output を使う）

use crate::error::{CropError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use insta_crop_common::{CropRectangle, Dimensions, Error as CommonError, TargetSize};

/// 領域を切り出し、出力サイズと異なればLanczos3でリサンプリングする
pub fn render(image: &DynamicImage, rect: CropRectangle, target: TargetSize) -> Result<DynamicImage> {
    let dims = Dimensions::new(image.width(), image.height())?;
    if !rect.fits_within(dims) {
        return Err(CommonError::InvalidGeometry(format!(
            "切り抜き領域 {} が画像 {} に収まりません",
            rect, dims
        ))
        .into());
    }

    let cropped = image.crop_imm(rect.left, rect.top, rect.width(), rect.height());
    if cropped.width() == target.width && cropped.height() == target.height {
        return Ok(cropped);
    }

    let resized = cropped.resize_exact(target.width, target.height, FilterType::Lanczos3);
    tracing::debug!(
        from = %format!("{}x{}", cropped.width(), cropped.height()),
        to = %format!("{}x{}", target.width, target.height),
        "リサンプリング"
    );
    Ok(resized)
}

/// JPEGにエンコード（メタデータなし）
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// AI解析へ送るJPEGを作成（長辺を max_size 以下に縮小）
pub fn prepare_upload(image: &DynamicImage, max_size: u32, quality: u8) -> Result<Vec<u8>> {
    let longest = image.width().max(image.height());
    if max_size > 0 && longest > max_size {
        let scaled = image.resize(max_size, max_size, FilterType::Triangle);
        encode_jpeg(&scaled, quality)
    } else {
        encode_jpeg(image, quality)
    }
}
