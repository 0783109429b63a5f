//! 条目 CRUD 子模块
//!
//! ## 职责
//! - `Clipboards` 表的增删改查
//! - 基于 `version` 列的乐观并发更新
//!
//! ## 错误语义
//! - 条目不存在：`AppError::NotFound`
//! - 内容为空：`AppError::Validation`
//! - 版本号不匹配：`AppError::Conflict`
//! - 其余 SQL 失败：`AppError::Database`

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;

use super::ClipboardEntry;

fn map_entry(row: &Row<'_>) -> rusqlite::Result<ClipboardEntry> {
    Ok(ClipboardEntry {
        id: row.get(0)?,
        alias: row.get(1)?,
        content: row.get(2)?,
        version: row.get(3)?,
    })
}

fn ensure_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content 不能为空".to_string()));
    }
    Ok(())
}

pub(super) fn list_entries(conn: &Connection) -> Result<Vec<ClipboardEntry>, AppError> {
    let mut stmt = conn
        .prepare("SELECT id, alias, content, version FROM Clipboards ORDER BY id ASC")
        .map_err(|e| AppError::Database(format!("准备查询失败: {}", e)))?;

    let entries = stmt
        .query_map([], map_entry)
        .map_err(|e| AppError::Database(format!("查询条目失败: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(format!("读取行失败: {}", e)))?;

    Ok(entries)
}

pub(super) fn get_entry(conn: &Connection, id: i64) -> Result<ClipboardEntry, AppError> {
    conn.query_row(
        "SELECT id, alias, content, version FROM Clipboards WHERE id = ?1",
        params![id],
        map_entry,
    )
    .optional()
    .map_err(|e| AppError::Database(format!("查询条目失败: {}", e)))?
    .ok_or(AppError::NotFound(id))
}

pub(super) fn create_entry(
    conn: &Connection,
    alias: Option<String>,
    content: String,
) -> Result<ClipboardEntry, AppError> {
    ensure_content(&content)?;

    conn.execute(
        "INSERT INTO Clipboards (alias, content, version) VALUES (?1, ?2, 0)",
        params![alias, content],
    ).map_err(|e| AppError::Database(format!("插入条目失败: {}", e)))?;

    let id = conn.last_insert_rowid();
    Ok(ClipboardEntry { id, alias, content, version: 0 })
}

pub(super) fn update_entry(
    conn: &Connection,
    id: i64,
    alias: Option<String>,
    content: String,
    expected_version: Option<i64>,
) -> Result<ClipboardEntry, AppError> {
    ensure_content(&content)?;

    let changed = conn.execute(
        "UPDATE Clipboards
         SET alias = ?1, content = ?2, version = version + 1
         WHERE id = ?3 AND (?4 IS NULL OR version = ?4)",
        params![alias, content, id, expected_version],
    ).map_err(|e| AppError::Database(format!("更新条目失败: {}", e)))?;

    if changed == 0 {
        // 未写入任何行：区分“条目已删除”与“版本已被他人推进”
        if entry_exists(conn, id)? {
            log::warn!("条目 {} 更新冲突，期望版本 {:?}", id, expected_version);
            return Err(AppError::Conflict(id));
        }
        return Err(AppError::NotFound(id));
    }

    get_entry(conn, id)
}

pub(super) fn delete_entry(conn: &Connection, id: i64) -> Result<(), AppError> {
    conn.execute("DELETE FROM Clipboards WHERE id = ?1", params![id])
        .map_err(|e| AppError::Database(format!("删除条目失败: {}", e)))?;
    Ok(())
}

pub(super) fn entry_exists(conn: &Connection, id: i64) -> Result<bool, AppError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM Clipboards WHERE id = ?1)",
        params![id],
        |row| row.get::<_, bool>(0),
    )
    .map_err(|e| AppError::Database(format!("查询条目是否存在失败: {}", e)))
}

pub(super) fn count_entries(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("SELECT COUNT(*) FROM Clipboards", [], |row| row.get(0))
        .map_err(|e| AppError::Database(format!("查询总数失败: {}", e)))
}
