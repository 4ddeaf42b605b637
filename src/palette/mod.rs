//! # 调色板核心模块（palette）
//!
//! ## 设计思路
//!
//! 这里是整个项目唯一带“算法”的部分，保持为纯函数：
//! 不做 I/O、不读配置锁、不打日志以外的副作用，输入相同则输出相同。
//!
//! - `sampler`：把任意尺寸的位图等比缩放到固定上限，控制后续计算量
//! - `quantizer`：分桶计数 + 稳定排序，取出现频率最高的 K 个颜色
//! - `grayscale`：基于通道差值的灰度图判定
//!
//! ## 实现思路
//!
//! 上层（`extractor`）负责校验与解码，得到 `Bitmap` 后依次调用：
//!
//! ```text
//! Bitmap ──downscale──▶ Bitmap' ──rank──▶ Vec<RankedColor> ──to_hex──▶ Palette
//!                          └──────is_grayscale──▶ bool
//! ```

pub mod grayscale;
pub mod quantizer;
pub mod sampler;

use serde::{Deserialize, Serialize};

use crate::extractor::ExtractError;

pub use grayscale::is_grayscale;
pub use quantizer::{bucket_channel, extract_palette, rank, rank_pixels, to_hex, ColorKey, RankedColor};
pub use sampler::{downscale, downscale_with_filter, scaled_dimensions};

/// 有序的 `#RRGGBB` 颜色列表，按出现频率从高到低排列。
pub type Palette = Vec<String>;

/// 解码后的位图：宽、高与 RGBA 像素（每像素 4 字节）。
///
/// 只能通过 [`Bitmap::new`] 构造，保证 `pixels.len() == width * height * 4`
/// 且宽高均为正数，核心算法因此无需再做防御性检查。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// 校验尺寸与缓冲长度后构造位图。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::palette::Bitmap;
    ///
    /// let bitmap = Bitmap::new(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255])?;
    /// assert_eq!(bitmap.pixel_count(), 2);
    /// # Ok::<(), palette_extractor::extractor::ExtractError>(())
    /// ```
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ExtractError> {
        if width == 0 || height == 0 {
            return Err(ExtractError::CorruptImage(format!(
                "位图尺寸无效：{}x{}",
                width, height
            )));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ExtractError::CorruptImage("位图尺寸导致长度溢出".to_string()))?;

        if pixels.len() != expected_len {
            return Err(ExtractError::CorruptImage(format!(
                "像素缓冲长度异常：{} 字节（期望 {} 字节）",
                pixels.len(),
                expected_len
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 用单一颜色填充的位图，主要供测试与示例使用。
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, ExtractError> {
        let count = (width as usize).saturating_mul(height as usize);
        let pixels = rgba.iter().copied().cycle().take(count.saturating_mul(4)).collect();
        Self::new(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA 原始字节（只读）。
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len() / 4
    }
}

/// 一次成功提取的完整结果，也是缓存层持久化的单位。
///
/// JSON 字段使用 camelCase，与 `lastPalette` 缓存格式保持一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub colors: Palette,
    pub is_grayscale: bool,
    pub source_name: String,
    /// RFC 3339 / ISO-8601 UTC 时间戳。
    pub extracted_at: String,
}

impl ExtractionResult {
    /// 以当前 UTC 时间作为时间戳创建结果。
    pub fn new(colors: Palette, is_grayscale: bool, source_name: impl Into<String>) -> Self {
        Self {
            colors,
            is_grayscale,
            source_name: source_name.into(),
            extracted_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}
