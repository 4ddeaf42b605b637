//! SQLite 键值存储子模块
//!
//! ## 职责
//! - 打开 / 创建数据库文件（WAL 模式）
//! - 初始化 `kv_store` 表并维护 `PRAGMA user_version`
//! - 提供 `KeyValueStore` 的持久化实现
//!
//! ## 错误语义
//! - 打开、DDL、读写失败统一映射为 `AppError::Storage`

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;

use super::KeyValueStore;

const SCHEMA_VERSION: i64 = 1;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn get_user_version(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Storage(format!("读取数据库版本失败: {}", e)))
}

fn set_user_version(conn: &Connection, version: i64) -> Result<(), AppError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| AppError::Storage(format!("写入数据库版本失败: {}", e)))
}

fn initialize_schema(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .map_err(|e| AppError::Storage(format!("创建键值表失败: {}", e)))?;

    let version = get_user_version(conn)?;
    if version < SCHEMA_VERSION {
        log::info!("数据库 schema 升级: {} -> {}", version, SCHEMA_VERSION);
        set_user_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}

impl SqliteStore {
    /// 打开（必要时创建）数据库文件。
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::Storage(format!("创建数据库目录失败: {}", e)))?;
            }
        }
        log::debug!("数据库路径: {}", path.display());

        let conn = Connection::open(path)
            .map_err(|e| AppError::Storage(format!("打开数据库失败: {}", e)))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

        Self::from_connection(conn)
    }

    /// 内存数据库，主要用于测试。
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Storage(format!("打开内存数据库失败: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, AppError> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> Result<T, AppError>) -> Result<T, AppError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AppError::Storage(format!("获取数据库锁失败: {}", e)))?;
        op(&conn)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| AppError::Storage(format!("读取键值失败: {}", e)))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map(|_| ())
            .map_err(|e| AppError::Storage(format!("写入键值失败: {}", e)))
        })
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .map(|_| ())
                .map_err(|e| AppError::Storage(format!("删除键值失败: {}", e)))
        })
    }
}
