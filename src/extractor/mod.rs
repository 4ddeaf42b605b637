//! # 颜色提取入口模块（extractor）
//!
//! ## 设计思路
//!
//! 该模块把“输入校验 → 字节加载 → 解码 → 核心算法”按职责拆分为多个子模块，
//! 核心算法本身放在 `palette` 中，保持纯函数、不依赖任何 I/O。
//!
//! - `handler`：编排整条处理流水线
//! - `loader`：声明信息校验、文件 / Data URL 加载、签名校验
//! - `pipeline`：读取头部尺寸、分辨率限制、完整解码
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 对外仅暴露必要类型，加载与解码细节保持 `mod` 私有。
//!
//! ```text
//! ImageInput
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（MIME → 体积 → 加载 → 签名）
//!    ├─ pipeline.rs（头部尺寸 → 分辨率 → 解码）
//!    └─ palette（降采样 → 分桶排序 → 灰度判定）
//!    ↓
//! ExtractionResult / ExtractError
//! ```

mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use config::{
    ExtractorConfig,
    DEFAULT_ALLOWED_MIME_TYPES,
    DEFAULT_MAX_FILE_SIZE_BYTES,
    DEFAULT_MAX_HEIGHT,
    DEFAULT_MAX_WIDTH,
    DEFAULT_NUM_COLORS,
    DEFAULT_SAMPLE_MAX_DIMENSION,
    MAX_NUM_COLORS,
};
pub use error::ExtractError;
pub use handler::PaletteExtractor;
pub use source::{mime_from_extension, ImageInput, ImageSource};
