//! # 剪贴板服务层
//!
//! 编排五个 CRUD 操作，并在创建路径上加入人机验证闸门。
//!
//! ## 创建流程
//!
//! ```text
//! AwaitingToken ──token 为空──▶ Validation（不落库）
//!       │
//!       ├──content 为空──▶ Validation（不调用验证、不落库）
//!       │
//!       ▼
//!   verify(token) ──false──▶ Verification（不落库）
//!       │ true
//!       ▼
//!   store.create ──▶ Created
//! ```
//!
//! 其余路径（list / get / update / delete）直接透传到 `EntryStore`，
//! 服务层不缓存任何条目。

use std::sync::Arc;

use serde::Deserialize;

use crate::db::{ClipboardEntry, EntryStore};
use crate::error::AppError;
use crate::verification::TokenVerifier;

/// 创建请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub content: String,
    /// 客户端提交的验证 token；兼容 reCAPTCHA 控件默认字段名
    #[serde(default, alias = "g-recaptcha-response")]
    pub token: Option<String>,
}

/// 编辑请求
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEntryRequest {
    pub id: i64,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub content: String,
    /// 客户端读取时看到的版本号；缺省时按最后写入者胜出处理
    #[serde(default)]
    pub version: Option<i64>,
}

pub struct ClipboardService {
    store: Arc<EntryStore>,
    verifier: Arc<dyn TokenVerifier>,
}

impl ClipboardService {
    pub fn new(store: Arc<EntryStore>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { store, verifier }
    }

    pub fn list(&self) -> Result<Vec<ClipboardEntry>, AppError> {
        self.store.list()
    }

    pub fn get(&self, id: i64) -> Result<ClipboardEntry, AppError> {
        self.store.get(id)
    }

    /// 验证通过后创建条目
    pub async fn create(
        &self,
        request: CreateEntryRequest,
        remote_ip: Option<&str>,
    ) -> Result<ClipboardEntry, AppError> {
        let token = request
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Validation("缺少人机验证 token".to_string()))?;

        if request.content.trim().is_empty() {
            return Err(AppError::Validation("content 不能为空".to_string()));
        }

        if !self.verifier.verify(token, remote_ip).await {
            return Err(AppError::Verification("reCAPTCHA 校验未通过".to_string()));
        }

        let entry = self.store.create(request.alias, request.content)?;
        log::info!("创建条目 id={} alias={:?}", entry.id, entry.alias);
        Ok(entry)
    }

    /// 编辑条目；路径 id 必须与请求体 id 一致
    pub fn update(&self, id: i64, request: UpdateEntryRequest) -> Result<ClipboardEntry, AppError> {
        if request.id != id {
            return Err(AppError::Validation(format!(
                "路径 id ({}) 与请求体 id ({}) 不一致",
                id, request.id
            )));
        }

        let entry = self
            .store
            .update(id, request.alias, request.content, request.version)?;
        log::info!("更新条目 id={} version={}", entry.id, entry.version);
        Ok(entry)
    }

    /// 删除条目（幂等）
    pub fn delete(&self, id: i64) -> Result<(), AppError> {
        self.store.delete(id)?;
        log::info!("删除条目 id={}", id);
        Ok(())
    }
}
