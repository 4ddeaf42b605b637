//! # 调色板提取工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            宿主界面 / CLI (src/main.rs)                  │
//! │   选择图片 ── 展示色块 ── 复制颜色 ── 导出 ── 更换图片    │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ PaletteService (Result<T, AppError>)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕                                                  │
//! │  ┌─ service ──── 组合提取器 / 缓存 / 会话                 │
//! │  ├─ session ──── SessionState + 纯函数 reduce + 观察者    │
//! │  ├─ extractor ── 输入校验 · 加载 · 解码 · 编排            │
//! │  ├─ palette ──── 降采样 · 分桶排序 · 灰度判定（纯函数）   │
//! │  ├─ storage ──── KeyValueStore (内存 / JSON / SQLite)     │
//! │  ├─ export ───── palette.txt 文本导出                     │
//! │  ├─ clipboard ── 单个颜色写入系统剪贴板                   │
//! │  └─ error ────── AppError (统一错误类型)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`palette`] | 核心算法：`downscale`、`rank`、`is_grayscale`、`to_hex` |
//! | [`extractor`] | MIME / 体积 / 签名 / 分辨率校验，解码并驱动核心算法 |
//! | [`session`] | 当前调色板、错误提示与“已复制”标记的状态机 |
//! | [`service`] | 异步提交、缓存恢复、复制、导出、重置的统一入口 |
//! | [`storage`] | 最小键值存储接口与 `lastPalette` 缓存 |
//! | [`export`] | 调色板文本导出 |
//! | [`clipboard`] | 基于 `arboard` 的剪贴板写入（含重试） |
//! | [`error`] | 统一错误类型 `AppError` |

pub mod error;
pub mod clipboard;
pub mod export;
pub mod extractor;
pub mod palette;
pub mod service;
pub mod session;
pub mod storage;
