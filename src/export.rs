//! 调色板导出模块
//!
//! 导出格式固定：每行一个 `#RRGGBB`，行间用 `\n` 分隔，末尾不带换行，
//! 以 `text/plain` 提供给下载 / 保存协作者。

use std::fs;
use std::path::Path;

use crate::error::AppError;

pub const EXPORT_MIME_TYPE: &str = "text/plain";
pub const DEFAULT_EXPORT_FILE_NAME: &str = "palette.txt";

/// 可直接交给下载协作者的导出产物。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

/// 把调色板拼成导出文本。
pub fn palette_to_text(colors: &[String]) -> String {
    colors.join("\n")
}

pub fn build_artifact(colors: &[String]) -> ExportArtifact {
    ExportArtifact {
        file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        mime_type: EXPORT_MIME_TYPE,
        contents: palette_to_text(colors),
    }
}

/// 将调色板写入文件；空调色板不产出文件。
pub fn write_export(path: &Path, colors: &[String]) -> Result<(), AppError> {
    if colors.is_empty() {
        return Err(AppError::Export("调色板为空，没有可导出的颜色".to_string()));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, palette_to_text(colors))?;
    log::info!("💾 调色板已导出 - {}（{} 色）", path.display(), colors.len());
    Ok(())
}
