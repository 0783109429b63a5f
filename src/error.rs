//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，服务层、存储层与 HTTP 层共用，
//! 避免各模块分散的 `.map_err(|e| e.to_string())` 与字符串错误。
//!
//! 前四个变体（`NotFound` / `Validation` / `Verification` / `Conflict`）
//! 是调用方可恢复的业务错误；其余变体属于基础设施故障。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - `kind()` 给出稳定的机器可读分类，HTTP 层据此映射状态码。
//! - 实现 `Serialize` 将错误序列化为字符串，与日志输出保持一致。

use serde::Serialize;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 指定 id 的条目不存在
    #[error("条目不存在: id={0}")]
    NotFound(i64),

    /// 请求字段缺失或不合法（内容为空、token 为空、id 不一致）
    #[error("参数校验失败: {0}")]
    Validation(String),

    /// 人机验证未通过
    #[error("人机验证失败: {0}")]
    Verification(String),

    /// 并发更新冲突：条目在读取后已被其他请求修改
    #[error("条目已被并发修改: id={0}")]
    Conflict(i64),

    /// 数据库操作失败
    #[error("数据库错误: {0}")]
    Database(String),

    /// 配置加载或解析失败
    #[error("配置错误: {0}")]
    Config(String),

    /// HTTP 服务启动或监听失败
    #[error("HTTP 服务错误: {0}")]
    Server(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 机器可读的错误分类，用于 HTTP 响应体与状态码映射。
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::Verification(_) => "verification",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Server(_) => "server",
            AppError::Io(_) => "io",
        }
    }

    /// 是否为调用方可恢复的业务错误。
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Validation(_)
                | AppError::Verification(_)
                | AppError::Conflict(_)
        )
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn business_errors_are_recoverable_infra_errors_are_not() {
        assert!(AppError::NotFound(1).is_recoverable());
        assert!(AppError::Validation("x".into()).is_recoverable());
        assert!(AppError::Verification("x".into()).is_recoverable());
        assert!(AppError::Conflict(1).is_recoverable());
        assert!(!AppError::Database("x".into()).is_recoverable());
        assert!(!AppError::Config("x".into()).is_recoverable());
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&AppError::NotFound(7)).expect("serialize error");
        assert_eq!(json, "\"条目不存在: id=7\"");
    }
}
