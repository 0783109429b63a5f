//! 连接字符串解析子模块
//!
//! 支持三种写法：
//! - ADO 风格键值对：`Data Source=clipboard.db;Cache=Shared`（只取 `Data Source` / `DataSource` / `Filename`）
//! - 直接给出文件路径：`./data/clipboard.db`（不含上述键时整串按路径处理，路径里可以有 `=`）
//! - 内存数据库：`:memory:`

use std::path::PathBuf;

use crate::error::AppError;

const MEMORY_TARGET: &str = ":memory:";
const SOURCE_KEYS: [&str; 3] = ["data source", "datasource", "filename"];

/// 连接字符串解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbTarget {
    Memory,
    File(PathBuf),
}

impl DbTarget {
    pub fn parse(connection_string: &str) -> Result<Self, AppError> {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() {
            return Err(AppError::Config("数据库连接字符串为空".to_string()));
        }

        let source = match find_source_value(trimmed) {
            Some("") => {
                return Err(AppError::Config(format!("连接字符串的 Data Source 为空: {}", trimmed)));
            }
            Some(value) => value,
            None => trimmed,
        };

        if source.eq_ignore_ascii_case(MEMORY_TARGET) {
            return Ok(DbTarget::Memory);
        }
        Ok(DbTarget::File(PathBuf::from(source)))
    }
}

fn find_source_value(connection_string: &str) -> Option<&str> {
    connection_string
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| {
            let key = key.trim().to_ascii_lowercase();
            SOURCE_KEYS.contains(&key.as_str())
        })
        .map(|(_, value)| value.trim())
}
