use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::AppError;

use super::KeyValueStore;

/// 进程内键值存储，进程退出即丢失。
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|e| AppError::Storage(format!("获取内存存储锁失败: {}", e)))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").expect("get"), None);

        store.set("k", "v1").expect("set");
        store.set("k", "v2").expect("overwrite");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v2"));

        store.remove("k").expect("remove");
        store.remove("k").expect("remove missing key is fine");
        assert_eq!(store.get("k").expect("get"), None);
    }
}
