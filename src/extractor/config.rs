//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ExtractorConfig`，保证运行时行为可观测、可调整、可测试。
//! 校验阈值（MIME 白名单、体积、分辨率）与输出规模（颜色数）都由调用方提供，
//! 未提供时使用生产可用的默认值。
//!
//! ## 实现思路
//!
//! - `Default` 提供默认配置：50MB、1920×1200、5 色、常见位图 MIME。
//! - 支持从 JSON 文件加载；字段缺失取默认值，文件缺失或损坏整体回退默认值。
//! - `validate` 在配置生效前统一检查取值范围，避免非法配置进入流水线。
//! - 采样步长不是配置项：固定为每 4 个像素取 1 个。

use std::fs;
use std::path::Path;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::ExtractError;

pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1200;
pub const DEFAULT_NUM_COLORS: usize = 5;
pub const DEFAULT_SAMPLE_MAX_DIMENSION: u32 = 200;
pub const MAX_NUM_COLORS: usize = 64;
const MAX_SAMPLE_DIMENSION: u32 = 2048;

/// 默认允许的位图 MIME 类型。
///
/// `image/jpg` 不是标准类型，但部分浏览器 / 系统会这样上报，一并放行。
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

/// 颜色提取配置。
///
/// 字段覆盖了校验、采样与输出三个阶段。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    /// 允许的最大文件体积（字节）。
    pub max_file_size_bytes: u64,
    /// 解码后允许的最大宽度（像素）。
    pub max_width: u32,
    /// 解码后允许的最大高度（像素）。
    pub max_height: u32,
    /// 输出调色板的颜色数量。
    pub num_colors: usize,
    /// MIME 白名单（小写、不含参数）。
    pub allowed_mime_types: Vec<String>,
    /// 采样前缩放的目标单边长度。
    pub sample_max_dimension: u32,
    /// 缩放滤镜策略，JSON 中写作 `nearest` / `bilinear` / `catmullRom` / `gaussian` / `lanczos3`。
    #[serde(with = "filter_name")]
    pub resize_filter: FilterType,
}

fn default_resize_filter() -> FilterType {
    FilterType::Triangle
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            num_colors: DEFAULT_NUM_COLORS,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            sample_max_dimension: DEFAULT_SAMPLE_MAX_DIMENSION,
            resize_filter: default_resize_filter(),
        }
    }
}

impl ExtractorConfig {
    /// 校验配置取值范围。
    ///
    /// # 示例
    /// ```rust
    /// use palette_extractor::extractor::ExtractorConfig;
    ///
    /// let mut config = ExtractorConfig::default();
    /// config.num_colors = 0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ExtractError> {
        if !(1..=MAX_NUM_COLORS).contains(&self.num_colors) {
            return Err(ExtractError::InvalidConfig(format!(
                "numColors 必须在 1~{} 之间（当前：{}）",
                MAX_NUM_COLORS, self.num_colors
            )));
        }
        if self.max_file_size_bytes == 0 {
            return Err(ExtractError::InvalidConfig("maxFileSizeBytes 不能为 0".to_string()));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "最大分辨率无效：{}x{}",
                self.max_width, self.max_height
            )));
        }
        if self.allowed_mime_types.is_empty() {
            return Err(ExtractError::InvalidConfig("allowedMimeTypes 不能为空".to_string()));
        }
        if !(1..=MAX_SAMPLE_DIMENSION).contains(&self.sample_max_dimension) {
            return Err(ExtractError::InvalidConfig(format!(
                "sampleMaxDimension 必须在 1~{} 之间（当前：{}）",
                MAX_SAMPLE_DIMENSION, self.sample_max_dimension
            )));
        }
        Ok(())
    }

    /// MIME 是否在白名单内（忽略大小写与 `;` 之后的参数）。
    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        let normalized = normalize_mime(mime_type);
        self.allowed_mime_types
            .iter()
            .any(|allowed| normalize_mime(allowed) == normalized)
    }

    /// 从 JSON 文件加载配置；文件不存在或内容无效时回退默认值。
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(config) => config,
                Err(err) => {
                    log::warn!("⚠️ 配置文件解析失败，使用默认配置: {} ({})", path.display(), err);
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("⚠️ 配置文件读取失败，使用默认配置: {} ({})", path.display(), err);
                Self::default()
            }
        }
    }

    /// 以格式化 JSON 写入配置文件。
    pub fn save_to_path(&self, path: &Path) -> Result<(), ExtractError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ExtractError::InvalidConfig(format!("序列化配置失败: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| ExtractError::FileSystem(format!("写入配置文件失败: {}", e)))
    }
}

mod filter_name {
    use image::imageops::FilterType;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const NAMES: &[&str] = &["nearest", "bilinear", "catmullRom", "gaussian", "lanczos3"];

    fn to_name(filter: FilterType) -> &'static str {
        match filter {
            FilterType::Nearest => "nearest",
            FilterType::Triangle => "bilinear",
            FilterType::CatmullRom => "catmullRom",
            FilterType::Gaussian => "gaussian",
            FilterType::Lanczos3 => "lanczos3",
        }
    }

    fn from_name(name: &str) -> Option<FilterType> {
        match name {
            "nearest" => Some(FilterType::Nearest),
            "bilinear" | "triangle" => Some(FilterType::Triangle),
            "catmullRom" => Some(FilterType::CatmullRom),
            "gaussian" => Some(FilterType::Gaussian),
            "lanczos3" => Some(FilterType::Lanczos3),
            _ => None,
        }
    }

    pub fn serialize<S: Serializer>(filter: &FilterType, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(to_name(*filter))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FilterType, D::Error> {
        let name = String::deserialize(deserializer)?;
        from_name(&name).ok_or_else(|| de::Error::unknown_variant(&name, NAMES))
    }
}

pub(crate) fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
