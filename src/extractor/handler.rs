//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `PaletteExtractor` 只负责流程编排与配置管理，不持有任何 UI 状态。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 声明信息校验（MIME / 体积）
//! 3. 按来源加载原始字节 + 签名校验
//! 4. 解码为位图 + 分辨率校验
//! 5. 降采样 → 分桶排序 → 灰度判定
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ExtractorConfig>>` 支持运行时调整。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 每次调用只使用自己的位图与计数表，多个提取并发执行互不干扰。
//! - 记录 `load/decode/quantize/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::{ExtractError, ExtractorConfig, ImageInput};
use crate::palette::{self, Bitmap, ExtractionResult, Palette};

/// 颜色提取器。
#[derive(Clone)]
pub struct PaletteExtractor {
    config: Arc<RwLock<ExtractorConfig>>,
}

impl PaletteExtractor {
    /// 根据初始配置创建提取器，配置非法时直接拒绝。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::extractor::{ExtractorConfig, PaletteExtractor};
    ///
    /// let extractor = PaletteExtractor::new(ExtractorConfig::default())?;
    /// # Ok::<(), palette_extractor::extractor::ExtractError>(())
    /// ```
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ExtractorConfig, ExtractError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ExtractError::InvalidConfig("配置读取锁已中毒".to_string()))
    }

    /// 整体替换配置，校验失败时保持原配置不变。
    pub fn set_config(&self, config: ExtractorConfig) -> Result<(), ExtractError> {
        config.validate()?;

        let mut current = self
            .config
            .write()
            .map_err(|_| ExtractError::InvalidConfig("配置写入锁已中毒".to_string()))?;

        log::info!(
            "⚙️ 已更新提取配置（numColors={}, maxFileSize={}B, maxResolution={}x{}, sampleMax={}）",
            config.num_colors,
            config.max_file_size_bytes,
            config.max_width,
            config.max_height,
            config.sample_max_dimension
        );

        *current = config;
        Ok(())
    }

    /// 只调整输出颜色数量。
    pub fn set_num_colors(&self, num_colors: usize) -> Result<(), ExtractError> {
        let mut config = self.config_snapshot()?;
        config.num_colors = num_colors;
        self.set_config(config)
    }

    /// 处理主入口：校验、加载、解码并提取调色板。
    ///
    /// 任一校验失败都会立即返回，不会进入量化阶段。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use palette_extractor::extractor::{ExtractorConfig, ImageInput, PaletteExtractor};
    ///
    /// let extractor = PaletteExtractor::new(ExtractorConfig::default())?;
    /// let result = extractor.extract(ImageInput::from_path("photo.png"))?;
    /// println!("{:?}", result.colors);
    /// # Ok::<(), palette_extractor::extractor::ExtractError>(())
    /// ```
    pub fn extract(&self, input: ImageInput) -> Result<ExtractionResult, ExtractError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        if let Err(err) = Self::validate_declared(&input, &config) {
            log::warn!("🚫 输入校验未通过 - {}: {}", input.source_name, err);
            return Err(err);
        }

        let load_start = Instant::now();
        let raw = Self::load_source(input.source, &config).inspect_err(|err| {
            log::warn!("🚫 图片加载失败 - {}: {}", input.source_name, err);
        })?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let bitmap = Self::decode_to_bitmap(raw, &config).inspect_err(|err| {
            log::warn!("🚫 图片解码失败 - {}: {}", input.source_name, err);
        })?;
        let decode_elapsed = decode_start.elapsed();

        let quantize_start = Instant::now();
        let (colors, is_grayscale) = Self::extract_from_bitmap(&bitmap, &config);
        let quantize_elapsed = quantize_start.elapsed();

        log::info!(
            "✅ 调色板提取完成 - {} colors={} grayscale={} load={}ms decode={}ms quantize={}ms total={}ms",
            input.source_name,
            colors.len(),
            is_grayscale,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            quantize_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ExtractionResult::new(colors, is_grayscale, input.source_name))
    }

    /// 对已解码的位图执行核心算法：降采样 → 排名 → 灰度判定。
    ///
    /// 调用方自己完成解码时可直接使用；不会失败。
    pub fn extract_from_bitmap(bitmap: &Bitmap, config: &ExtractorConfig) -> (Palette, bool) {
        let sampled = palette::downscale_with_filter(
            bitmap,
            config.sample_max_dimension,
            config.resize_filter,
        );
        let colors = palette::extract_palette(&sampled, config.num_colors);
        let is_grayscale = palette::is_grayscale(&sampled);
        (colors, is_grayscale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ImageSource;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn encode_png(img: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn uniform_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        encode_png(ImageBuffer::from_pixel(width, height, Rgba(rgba)))
    }

    #[test]
    fn uniform_png_extracts_single_color() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");
        let input = ImageInput::from_bytes("violet.png", "image/png", uniform_png(300, 200, [120, 50, 200, 255]));

        let result = extractor.extract(input).expect("extraction should succeed");

        assert_eq!(result.colors, vec!["#7832C8".to_string()]);
        assert!(!result.is_grayscale);
        assert_eq!(result.source_name, "violet.png");
    }

    #[test]
    fn transparent_png_ranks_raw_rgb_at_any_size() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");

        for (width, height) in [(200, 100), (400, 200)] {
            let input = ImageInput::from_bytes(
                "clear.png",
                "image/png",
                uniform_png(width, height, [120, 50, 200, 0]),
            );
            let result = extractor.extract(input).expect("extraction should succeed");
            assert_eq!(result.colors, vec!["#7832C8".to_string()], "{width}x{height}");
        }
    }

    #[test]
    fn gray_png_is_flagged_grayscale() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");
        let input = ImageInput::from_bytes("gray.png", "image/png", uniform_png(64, 64, [128, 128, 128, 255]));

        let result = extractor.extract(input).expect("extraction should succeed");

        assert!(result.is_grayscale);
        assert_eq!(result.colors, vec!["#828282".to_string()]);
    }

    #[test]
    fn invalid_type_short_circuits_before_loading() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");
        let input = ImageInput {
            source_name: "doc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            declared_size: 1,
            source: ImageSource::FilePath("/nonexistent/doc.pdf".into()),
        };

        assert!(matches!(extractor.extract(input), Err(ExtractError::InvalidType(_))));
    }

    #[test]
    fn corrupt_payload_with_image_mime_is_rejected() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");
        let input = ImageInput::from_bytes("fake.png", "image/png", b"definitely not a png".to_vec());

        assert!(matches!(extractor.extract(input), Err(ExtractError::CorruptImage(_))));
    }

    #[test]
    fn num_colors_limits_palette_length() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");
        extractor.set_num_colors(2).expect("set num colors");

        let img = ImageBuffer::from_fn(120, 120, |x, _| {
            let band = (x / 30) as u8;
            Rgba([band * 60, 255 - band * 60, 40, 255])
        });
        let input = ImageInput::from_bytes("bands.png", "image/png", encode_png(img));

        let result = extractor.extract(input).expect("extraction should succeed");
        assert_eq!(result.colors.len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected_and_previous_kept() {
        let extractor = PaletteExtractor::new(ExtractorConfig::default()).expect("extractor init failed");

        assert!(matches!(extractor.set_num_colors(0), Err(ExtractError::InvalidConfig(_))));
        assert_eq!(extractor.config_snapshot().expect("snapshot").num_colors, 5);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = ExtractorConfig::default();
        config.max_width = 0;
        assert!(PaletteExtractor::new(config).is_err());
    }
}
