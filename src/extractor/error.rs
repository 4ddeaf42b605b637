//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载提取链路中的所有失败原因，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 四类校验失败（类型 / 体积 / 损坏 / 分辨率）都是终止性的：
//! 调用方展示消息即可，不应重试，也不应继续进入量化阶段。

/// 颜色提取统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("文件类型不支持：{0}")]
    InvalidType(String),

    #[error("文件过大：{0}")]
    TooLarge(String),

    #[error("图片已损坏或无法解码：{0}")]
    CorruptImage(String),

    #[error("图片分辨率超出限制：{0}")]
    ResolutionExceeded(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("配置无效：{0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// 稳定的错误码，供前端 / CLI 按码分支而不解析文案。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidType(_) => "invalid_type",
            Self::TooLarge(_) => "too_large",
            Self::CorruptImage(_) => "corrupt_image",
            Self::ResolutionExceeded(_) => "resolution_exceeded",
            Self::FileSystem(_) => "file_system",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }

    /// 出错所在阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidType(_) | Self::TooLarge(_) => "validate",
            Self::FileSystem(_) => "load",
            Self::CorruptImage(_) | Self::ResolutionExceeded(_) => "decode",
            Self::InvalidConfig(_) => "config",
        }
    }
}

impl From<ExtractError> for String {
    fn from(error: ExtractError) -> Self {
        error.to_string()
    }
}
