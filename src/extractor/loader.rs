//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（内存字节 / 本地文件 / Data URL）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验。目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! 校验顺序固定，前一关失败后一关不会执行：
//! 1. MIME 白名单（只看声明值，不读字节）
//! 2. 声明体积（只看声明值，不读字节）
//! 3. 按来源加载：文件先看 metadata 体积，Data URL 先估算解码后上限
//! 4. 文件签名（magic bytes）必须是图片，否则按损坏处理（fail closed）

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::config::normalize_mime;
use super::source::RawImageData;
use super::{ExtractError, ExtractorConfig, ImageInput, ImageSource, PaletteExtractor};

fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

fn too_large(actual: u64, limit: u64) -> ExtractError {
    ExtractError::TooLarge(format!("{}（限制：{}）", format_mb(actual), format_mb(limit)))
}

impl PaletteExtractor {
    /// 只基于声明信息的前置校验：MIME 白名单 + 声明体积。
    ///
    /// 这一步不会触碰任何字节。
    pub(crate) fn validate_declared(
        input: &ImageInput,
        config: &ExtractorConfig,
    ) -> Result<(), ExtractError> {
        if !config.is_mime_allowed(&input.mime_type) {
            return Err(ExtractError::InvalidType(format!(
                "{}（允许：{}）",
                normalize_mime(&input.mime_type),
                config.allowed_mime_types.join(", ")
            )));
        }

        if input.declared_size > config.max_file_size_bytes {
            return Err(too_large(input.declared_size, config.max_file_size_bytes));
        }

        Ok(())
    }

    /// 按来源加载原始字节，并完成签名校验。
    pub(crate) fn load_source(
        source: ImageSource,
        config: &ExtractorConfig,
    ) -> Result<RawImageData, ExtractError> {
        let raw = match source {
            ImageSource::Bytes(bytes) => {
                if bytes.len() as u64 > config.max_file_size_bytes {
                    return Err(too_large(bytes.len() as u64, config.max_file_size_bytes));
                }
                RawImageData {
                    bytes,
                    source_hint: "bytes",
                }
            }
            ImageSource::FilePath(path) => Self::load_from_file(&path, config)?,
            ImageSource::DataUrl(data) => Self::load_from_data_url(&data, config)?,
        };

        Self::validate_image_signature(&raw.bytes)?;
        Ok(raw)
    }

    /// 从本地路径加载图片原始字节。
    fn load_from_file(path: &Path, config: &ExtractorConfig) -> Result<RawImageData, ExtractError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(ExtractError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ExtractError::FileSystem(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > config.max_file_size_bytes {
            return Err(too_large(metadata.len(), config.max_file_size_bytes));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| ExtractError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 从 Data URL / 纯 Base64 加载图片原始字节。
    fn load_from_data_url(data: &str, config: &ExtractorConfig) -> Result<RawImageData, ExtractError> {
        log::info!("📝 开始处理 Data URL 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size_bytes)?;
        if bytes.len() as u64 > config.max_file_size_bytes {
            return Err(too_large(bytes.len() as u64, config.max_file_size_bytes));
        }

        Ok(RawImageData {
            bytes,
            source_hint: "data-url",
        })
    }

    /// 去掉 `data:*;base64,` 头并解码，解码前先按长度估算上限。
    pub(crate) fn parse_base64_with_limit(data: &str, max_size: u64) -> Result<Vec<u8>, ExtractError> {
        let payload = match data.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => {
                if !header.ends_with(";base64") {
                    return Err(ExtractError::CorruptImage("Data URL 不是 Base64 编码".to_string()));
                }
                payload
            }
            _ => data,
        };
        let payload = payload.trim();

        let upper_bound = (payload.len() as u64).div_ceil(4) * 3;
        if upper_bound > max_size {
            return Err(too_large(upper_bound, max_size));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ExtractError::CorruptImage(format!("Base64 解码失败：{}", e)))
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    pub(crate) fn validate_image_signature(bytes: &[u8]) -> Result<(), ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::CorruptImage("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ExtractError::CorruptImage("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ExtractError::CorruptImage(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(())
    }
}
