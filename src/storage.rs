//! 调色板持久化模块
//!
//! # 设计思路
//!
//! 核心算法不依赖任何存储；“记住上一次的调色板”只是调用方的附加能力。
//! 因此这里抽象出最小的 `KeyValueStore`（`get / set / remove`），
//! 由调用方注入具体实现，核心与持久化彻底解耦。
//!
//! # 实现思路
//!
//! - `MemoryStore`：进程内 `HashMap`，用于测试与 `--no-cache`。
//! - `JsonFileStore`：单个 JSON 对象文件，结构简单、可手工查看。
//! - `SqliteStore`：`rusqlite` 单表键值，带 schema 版本号。
//! - `PaletteCache`：在任意 store 上以 `lastPalette` 键读写 `ExtractionResult`。
//!   所有失败都只记日志并吞掉：缓存不可用时应用照常运行，只是没有缓存。

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AppError;
use crate::palette::ExtractionResult;

/// 上一次提取结果在 store 中的键名。
pub const LAST_PALETTE_KEY: &str = "lastPalette";

/// 最小键值存储接口。
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        (**self).remove(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        (**self).remove(key)
    }
}

/// 默认数据库路径：平台数据目录下的 `palette.db`。
pub fn default_db_path() -> Result<PathBuf, AppError> {
    let dirs = directories::ProjectDirs::from("", "", "palette-extractor")
        .ok_or_else(|| AppError::Storage("无法确定应用数据目录".to_string()))?;
    Ok(dirs.data_dir().join("palette.db"))
}

/// 上一次提取结果的尽力而为缓存。
pub struct PaletteCache<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PaletteCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// 读取上一次结果；store 故障或内容损坏时返回 `None`。
    ///
    /// 损坏的值会被顺手移除，避免每次启动都解析失败。
    pub fn load(&self) -> Option<ExtractionResult> {
        let raw = match self.store.get(LAST_PALETTE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("⚠️ 读取调色板缓存失败，忽略缓存: {}", err);
                return None;
            }
        };

        match serde_json::from_str::<ExtractionResult>(&raw) {
            Ok(result) => {
                log::debug!("♻️ 命中调色板缓存 - {}", result.source_name);
                Some(result)
            }
            Err(err) => {
                log::warn!("⚠️ 调色板缓存内容损坏，已丢弃: {}", err);
                if let Err(remove_err) = self.store.remove(LAST_PALETTE_KEY) {
                    log::warn!("⚠️ 清理损坏缓存失败: {}", remove_err);
                }
                None
            }
        }
    }

    /// 保存结果；失败只记日志，返回是否成功。
    pub fn save(&self, result: &ExtractionResult) -> bool {
        let payload = match serde_json::to_string(result) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("⚠️ 序列化调色板失败，跳过缓存: {}", err);
                return false;
            }
        };

        match self.store.set(LAST_PALETTE_KEY, &payload) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("⚠️ 写入调色板缓存失败，跳过缓存: {}", err);
                false
            }
        }
    }

    /// 清除缓存；失败只记日志，返回是否成功。
    pub fn clear(&self) -> bool {
        match self.store.remove(LAST_PALETTE_KEY) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("⚠️ 清除调色板缓存失败: {}", err);
                false
            }
        }
    }
}
