//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入”和“流水线中间结果”解耦：
//! - `ImageInput` 表示文件选择 / 拖放协作者交过来的输入：文件名、声明的 MIME、声明的体积
//! - `ImageSource` 表示字节从哪里来（内存 / 本地路径 / Data URL）
//! - `RawImageData` 表示已加载但未解码的字节
//!
//! 声明的 MIME 与体积在读取任何字节之前就会被校验。

use std::path::{Path, PathBuf};

/// 图片字节来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 已在内存中的原始字节。
    Bytes(Vec<u8>),
    /// 本地文件路径。
    FilePath(PathBuf),
    /// `data:image/png;base64,...` 形式的 Data URL，或纯 Base64 字符串。
    DataUrl(String),
}

/// 一次提取请求的输入。
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// 源文件名（写入结果元数据）。
    pub source_name: String,
    /// 调用方声明的 MIME 类型。
    pub mime_type: String,
    /// 调用方声明的字节数。
    pub declared_size: u64,
    pub source: ImageSource,
}

impl ImageInput {
    /// 由内存字节构造，声明体积取字节长度。
    pub fn from_bytes(
        source_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            mime_type: mime_type.into(),
            declared_size: bytes.len() as u64,
            source: ImageSource::Bytes(bytes),
        }
    }

    /// 由本地路径构造。
    ///
    /// 声明的 MIME 按扩展名推断（与浏览器文件选择器一致，不读取内容），
    /// 声明体积来自文件元数据；都拿不到时分别记为 `application/octet-stream` 与 0，
    /// 由后续校验阶段拒绝或再次检查。
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        let declared_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Self {
            source_name,
            mime_type: mime_from_extension(path).to_string(),
            declared_size,
            source: ImageSource::FilePath(path.to_path_buf()),
        }
    }

    /// 由 Data URL 构造；MIME 取自 `data:` 头，体积按 Base64 解码后上限估算。
    pub fn from_data_url(source_name: impl Into<String>, data_url: impl Into<String>) -> Self {
        let data_url = data_url.into();
        let mime_type = data_url_mime(&data_url).unwrap_or("application/octet-stream").to_string();
        let payload_len = data_url
            .split_once(',')
            .map(|(_, payload)| payload.len())
            .unwrap_or(data_url.len());
        let declared_size = (payload_len as u64).div_ceil(4) * 3;

        Self {
            source_name: source_name.into(),
            mime_type,
            declared_size,
            source: ImageSource::DataUrl(data_url),
        }
    }
}

/// 按扩展名推断 MIME。
pub fn mime_from_extension(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

fn data_url_mime(data_url: &str) -> Option<&str> {
    let header = data_url.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?.trim();
    (!mime.is_empty()).then_some(mime)
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_inferred_from_extension() {
        assert_eq!(mime_from_extension(Path::new("a/b/photo.PNG")), "image/png");
        assert_eq!(mime_from_extension(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(mime_from_extension(Path::new("report.pdf")), "application/octet-stream");
        assert_eq!(mime_from_extension(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn data_url_header_provides_mime_and_size() {
        let input = ImageInput::from_data_url("x.png", "data:image/png;base64,AAAA");
        assert_eq!(input.mime_type, "image/png");
        assert_eq!(input.declared_size, 3);
    }

    #[test]
    fn plain_base64_has_unknown_mime() {
        let input = ImageInput::from_data_url("x", "AAAAAAAA");
        assert_eq!(input.mime_type, "application/octet-stream");
        assert_eq!(input.declared_size, 6);
    }

    #[test]
    fn missing_file_declares_zero_size() {
        let input = ImageInput::from_path("/definitely/not/here/picture.webp");
        assert_eq!(input.source_name, "picture.webp");
        assert_eq!(input.mime_type, "image/webp");
        assert_eq!(input.declared_size, 0);
    }
}
