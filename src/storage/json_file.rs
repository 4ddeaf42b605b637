//! JSON 文件键值存储
//!
//! ## 职责
//! - 以单个 JSON 对象文件保存所有键值（`{ "lastPalette": "..." }`）
//! - 文件不存在视为空 store，首次写入时自动创建父目录
//!
//! ## 错误语义
//! - 读写或解析失败统一映射为 `AppError::Storage`
//! - 同一实例内的读改写由 `Mutex` 串行化

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::error::AppError;

use super::KeyValueStore;

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, AppError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Storage(format!("读取存储文件失败: {}", e)))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)
            .map_err(|e| AppError::Storage(format!("解析存储文件失败: {}", e)))?
        {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::Storage("存储文件顶层不是 JSON 对象".to_string())),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::Storage(format!("创建存储目录失败: {}", e)))?;
            }
        }

        let content = serde_json::to_string_pretty(map)
            .map_err(|e| AppError::Storage(format!("序列化存储内容失败: {}", e)))?;
        fs::write(&self.path, content)
            .map_err(|e| AppError::Storage(format!("写入存储文件失败: {}", e)))
    }

    fn modify(&self, op: impl FnOnce(&mut Map<String, Value>)) -> Result<(), AppError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| AppError::Storage(format!("获取存储写锁失败: {}", e)))?;
        let mut map = self.read_map()?;
        op(&mut map);
        self.write_map(&map)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_map()?.get(key).and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.modify(|map| {
            map.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|map| {
            map.remove(key);
        })
    }
}
