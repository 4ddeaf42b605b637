//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA 位图”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先读取 header 做分辨率检查，再进行完整解码，降低超大输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸（失败按损坏处理）
//! 2. 按最大宽高快速拒绝
//! 3. 完整解码（多帧格式只取第一帧）
//! 4. 再次校验解码后的尺寸，转换 RGBA 并构造 `Bitmap`

use image::{GenericImageView, ImageReader};
use std::io::Cursor;

use super::source::RawImageData;
use super::{ExtractError, ExtractorConfig, PaletteExtractor};
use crate::palette::Bitmap;

impl PaletteExtractor {
    /// 将原始字节解码为位图，期间执行分辨率校验。
    pub(crate) fn decode_to_bitmap(
        raw: RawImageData,
        config: &ExtractorConfig,
    ) -> Result<Bitmap, ExtractError> {
        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_resolution(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| ExtractError::CorruptImage(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        Self::validate_resolution(config, width, height)?;

        let bitmap = Bitmap::new(width, height, decoded.to_rgba8().into_raw())?;

        log::info!(
            "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
            raw.source_hint,
            width,
            height
        );

        Ok(bitmap)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做分辨率检查。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ExtractError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ExtractError::CorruptImage(format!("无法识别图片格式：{}", e)))?;

        reader
            .into_dimensions()
            .map_err(|e| ExtractError::CorruptImage(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验宽高是否超过配置上限。
    pub(crate) fn validate_resolution(
        config: &ExtractorConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ExtractError> {
        if width > config.max_width || height > config.max_height {
            return Err(ExtractError::ResolutionExceeded(format!(
                "{}x{}（限制：{}x{}）",
                width, height, config.max_width, config.max_height
            )));
        }

        Ok(())
    }
}
