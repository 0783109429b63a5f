//! 数据库模块（Entry Store）
//!
//! # 设计思路
//!
//! 剪贴板条目的持久化全部集中在此模块，使用 `rusqlite` 直接操作 SQLite。
//! 连接由 `EntryStore` 显式持有，并通过 `Arc` 传递给服务层，
//! 不存在进程级全局单例。
//!
//! # 实现思路
//!
//! - `config`：解析连接字符串（`Data Source=...` / 路径 / `:memory:`）。
//! - `schema`：基于 `PRAGMA user_version` 的幂等建表与迁移。
//! - `entries`：面向 `&Connection` 的 CRUD 纯函数，便于单测。
//! - `EntryStore`：`Mutex<Connection>` 封装，串行化所有数据库访问。

use std::fs;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

mod config;
mod entries;
mod schema;

pub use config::DbTarget;

// ============================================================================
// 数据模型
// ============================================================================

/// 剪贴板条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub id: i64,
    pub alias: Option<String>,
    pub content: String,
    /// 行版本号，每次成功更新后自增，用于乐观并发检测
    pub version: i64,
}

// ============================================================================
// 存储句柄
// ============================================================================

/// 数据库连接封装，由 `main.rs` 创建后显式注入服务层
pub struct EntryStore(Mutex<Connection>);

impl EntryStore {
    /// 按连接字符串打开数据库并完成 Schema 初始化
    pub fn open(connection_string: &str) -> Result<Self, AppError> {
        let target = DbTarget::parse(connection_string)?;
        let conn = match &target {
            DbTarget::Memory => Connection::open_in_memory().map_err(|e| {
                AppError::Database(format!("打开内存数据库失败: {}", e))
            })?,
            DbTarget::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).map_err(|e| {
                            AppError::Database(format!("创建数据库目录失败: {}", e))
                        })?;
                    }
                }
                log::info!("数据库路径: {}", path.display());
                Connection::open(path).map_err(|e| {
                    AppError::Database(format!("打开数据库失败: {}", e))
                })?
            }
        };
        Self::from_connection(conn)
    }

    /// 打开内存数据库，主要用于测试
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::open(":memory:")
    }

    /// 使用已有连接创建存储，并执行建表与迁移
    pub fn from_connection(conn: Connection) -> Result<Self, AppError> {
        schema::initialize_schema(&conn)?;
        Ok(Self(Mutex::new(conn)))
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> Result<T, AppError>) -> Result<T, AppError> {
        let conn = self.0.lock().map_err(|e| {
            AppError::Database(format!("获取数据库锁失败: {}", e))
        })?;
        op(&conn)
    }

    /// 返回全部条目（按 id 升序，即插入顺序）
    pub fn list(&self) -> Result<Vec<ClipboardEntry>, AppError> {
        self.with_conn(entries::list_entries)
    }

    pub fn get(&self, id: i64) -> Result<ClipboardEntry, AppError> {
        self.with_conn(|conn| entries::get_entry(conn, id))
    }

    /// 新建条目；`content` 为空时返回 `AppError::Validation`
    pub fn create(&self, alias: Option<String>, content: String) -> Result<ClipboardEntry, AppError> {
        self.with_conn(|conn| entries::create_entry(conn, alias, content))
    }

    /// 整体替换 alias / content。
    ///
    /// - `expected_version = Some(v)`：仅当库内版本仍为 `v` 时写入，否则返回 `Conflict`
    /// - `expected_version = None`：最后写入者胜出
    pub fn update(
        &self,
        id: i64,
        alias: Option<String>,
        content: String,
        expected_version: Option<i64>,
    ) -> Result<ClipboardEntry, AppError> {
        self.with_conn(|conn| entries::update_entry(conn, id, alias, content, expected_version))
    }

    /// 删除条目，条目不存在时同样返回成功
    pub fn delete(&self, id: i64) -> Result<(), AppError> {
        self.with_conn(|conn| entries::delete_entry(conn, id))
    }

    pub fn exists(&self, id: i64) -> Result<bool, AppError> {
        self.with_conn(|conn| entries::entry_exists(conn, id))
    }

    pub fn count(&self) -> Result<i64, AppError> {
        self.with_conn(entries::count_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::EntryStore;
    use crate::error::AppError;

    #[test]
    fn store_roundtrips_through_public_api() {
        let store = EntryStore::open_in_memory().expect("open store");

        let created = store
            .create(Some("x".to_string()), "hello".to_string())
            .expect("create entry");
        assert_eq!(created.id, 1);
        assert_eq!(created.version, 0);

        let fetched = store.get(created.id).expect("get entry");
        assert_eq!(fetched, created);
        assert_eq!(store.count().expect("count"), 1);

        store.delete(created.id).expect("delete entry");
        assert!(matches!(store.get(created.id), Err(AppError::NotFound(1))));
        assert!(!store.exists(created.id).expect("exists"));
    }

    #[test]
    fn open_accepts_data_source_connection_string() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("web-clipboard-store-test-{nanos}"));
        let db_path = dir.join("nested").join("clipboard.db");
        let conn_str = format!("Data Source={}", db_path.display());

        {
            let store = EntryStore::open(&conn_str).expect("open file store");
            store.create(None, "persisted".to_string()).expect("create entry");
        }

        let reopened = EntryStore::open(&conn_str).expect("reopen file store");
        let entries = reopened.list().expect("list entries");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "persisted");

        drop(reopened);
        let _ = std::fs::remove_dir_all(dir);
    }
}
