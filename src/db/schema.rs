//! Schema 初始化子模块
//!
//! ## 职责
//! - 创建 `Clipboards` 表
//! - 按 `PRAGMA user_version` 逐级迁移（v2 增加 `version` 乐观并发列）
//! - 设置 SQLite 运行参数（WAL）
//!
//! ## 错误语义
//! - DDL 失败或数据库版本高于当前程序，统一映射为 `AppError::Database`

use rusqlite::Connection;

use crate::error::AppError;

const SCHEMA_VERSION: i64 = 2;

fn get_user_version(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Database(format!("读取数据库版本失败: {}", e)))
}

fn set_user_version(conn: &Connection, version: i64) -> Result<(), AppError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| AppError::Database(format!("写入数据库版本失败: {}", e)))
}

fn create_base_table(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS Clipboards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            alias TEXT NULL,
            content TEXT NOT NULL
        );"
    ).map_err(|e| AppError::Database(format!("创建基础表失败: {}", e)))
}

fn has_column(conn: &Connection, column: &str) -> Result<bool, AppError> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(Clipboards)")
        .map_err(|e| AppError::Database(format!("读取表结构失败: {}", e)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| AppError::Database(format!("读取表结构失败: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(format!("读取行失败: {}", e)))?;
    Ok(columns.iter().any(|name| name.eq_ignore_ascii_case(column)))
}

fn add_version_column(conn: &Connection) -> Result<(), AppError> {
    if has_column(conn, "version")? {
        return Ok(());
    }
    conn.execute_batch("ALTER TABLE Clipboards ADD COLUMN version INTEGER NOT NULL DEFAULT 0;")
        .map_err(|e| AppError::Database(format!("执行 v2 版本列迁移失败: {}", e)))
}

/// 在同一事务内执行迁移步骤并写入目标版本，任一步失败整体回滚
fn run_migration<F>(conn: &Connection, target: i64, apply: F) -> Result<(), AppError>
where
    F: FnOnce(&Connection) -> Result<(), AppError>,
{
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| AppError::Database(format!("开始 v{} 迁移事务失败: {}", target, e)))?;
    apply(&tx)?;
    set_user_version(&tx, target)?;
    tx.commit()
        .map_err(|e| AppError::Database(format!("提交 v{} 迁移事务失败: {}", target, e)))
}

pub(super) fn initialize_schema(conn: &Connection) -> Result<(), AppError> {
    // 内存库不支持 WAL，失败时忽略
    conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

    let mut version = get_user_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(AppError::Database(format!(
            "数据库版本高于当前程序: current={}, expected={}",
            version, SCHEMA_VERSION
        )));
    }

    create_base_table(conn)?;
    if version < 1 {
        set_user_version(conn, 1)?;
        version = 1;
    }

    if version < 2 {
        run_migration(conn, 2, add_version_column)?;
        version = 2;
    }

    if version != SCHEMA_VERSION {
        return Err(AppError::Database(format!(
            "数据库版本不匹配: current={}, expected={}",
            version, SCHEMA_VERSION
        )));
    }

    Ok(())
}
