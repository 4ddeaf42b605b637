//! # 降采样模块
//!
//! ## 设计思路
//!
//! 统计颜色之前先把位图等比缩放到 `max_dimension` 以内（也允许放大小图），
//! 使后续的访问次数最多为 `max_dimension² / 4`，与原图大小无关。
//!
//! ## 实现思路
//!
//! 1. `scale = min(max/width, max/height)`，两轴同一比例以保持宽高比
//! 2. 目标尺寸四舍五入，且至少为 1×1（极端长条图的短边会被压到 0）
//! 3. 优先使用 `fast_image_resize`（SIMD 卷积），失败时回退 `image::imageops::resize`
//! 4. 原位图保持不变，总是返回新的像素缓冲
//! 5. 不做 alpha 预乘：无论是否缩放，透明像素都按原始 RGB 参与统计

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageBuffer, Rgba};

use super::Bitmap;

/// 计算缩放后的目标尺寸。
///
/// # 示例
/// ```rust
/// use palette_extractor::palette::scaled_dimensions;
///
/// assert_eq!(scaled_dimensions(400, 100, 200), (200, 50));
/// assert_eq!(scaled_dimensions(100_000, 1, 200), (200, 1));
/// ```
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let width_f = width.max(1) as f64;
    let height_f = height.max(1) as f64;
    let max_f = max_dimension as f64;

    let scale = (max_f / width_f).min(max_f / height_f);

    let target_width = (width_f * scale).round().clamp(1.0, u32::MAX as f64) as u32;
    let target_height = (height_f * scale).round().clamp(1.0, u32::MAX as f64) as u32;

    (target_width, target_height)
}

/// 使用默认双线性滤镜降采样。
pub fn downscale(bitmap: &Bitmap, max_dimension: u32) -> Bitmap {
    downscale_with_filter(bitmap, max_dimension, FilterType::Triangle)
}

/// 使用指定滤镜降采样。对任意合法位图都不会失败。
pub fn downscale_with_filter(bitmap: &Bitmap, max_dimension: u32, filter: FilterType) -> Bitmap {
    let (width, height) = bitmap.dimensions();
    let (target_width, target_height) = scaled_dimensions(width, height, max_dimension);

    if (target_width, target_height) == (width, height) {
        return bitmap.clone();
    }

    log::debug!(
        "🧩 采样缩放：{}x{} -> {}x{}（filter={:?}）",
        width,
        height,
        target_width,
        target_height,
        filter
    );

    match resize_with_fast_image_resize(bitmap, target_width, target_height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}", err);
            resize_with_image(bitmap, target_width, target_height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    bitmap: &Bitmap,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<Bitmap, String> {
    let src_image = fr::images::Image::from_vec_u8(
        bitmap.width(),
        bitmap.height(),
        bitmap.pixels().to_vec(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| format!("构建源图像缓冲失败：{}", e))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    // RGB 与 alpha 分开卷积，透明像素保留原始颜色
    let options = fr::ResizeOptions::new()
        .resize_alg(to_fast_resize_alg(filter))
        .use_alpha(false);

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| format!("fast_image_resize 执行失败：{}", e))?;

    Bitmap::new(target_width, target_height, dst_image.into_vec()).map_err(|e| e.to_string())
}

fn resize_with_image(bitmap: &Bitmap, target_width: u32, target_height: u32, filter: FilterType) -> Bitmap {
    let Some(src) = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
        bitmap.width(),
        bitmap.height(),
        bitmap.pixels().to_vec(),
    ) else {
        log::error!("❌ 位图缓冲长度异常，放弃缩放");
        return bitmap.clone();
    };

    let resized = image::imageops::resize(&src, target_width, target_height, filter);
    let (width, height) = resized.dimensions();

    Bitmap::new(width, height, resized.into_raw()).unwrap_or_else(|err| {
        log::error!("❌ image::imageops::resize 输出异常，放弃缩放：{}", err);
        bitmap.clone()
    })
}

fn to_fast_resize_alg(filter: FilterType) -> fr::ResizeAlg {
    match filter {
        FilterType::Nearest => fr::ResizeAlg::Nearest,
        FilterType::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
        FilterType::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
        FilterType::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Mitchell),
        FilterType::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
    }
}
