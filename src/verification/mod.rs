//! # 人机验证模块（Verification Client）
//!
//! ## 设计思路
//!
//! 对外只暴露一个布尔契约：`verify(token) -> bool`。
//! 网络失败、响应格式错误、验证未通过都折叠为 `false`，调用方无法也无需区分；
//! 具体原因只写入日志，便于排查。
//!
//! ## 实现思路
//!
//! - `TokenVerifier`：服务层依赖的抽象，测试中可替换为桩实现。
//! - `RecaptchaVerifier`：基于 `reqwest` 的 Google reCAPTCHA 校验实现，
//!   带总超时、连接超时与一次有界重试。
//! - `SiteVerifyResponse`：siteverify 接口的 JSON 响应模型。

mod recaptcha;

use async_trait::async_trait;
use serde::Deserialize;

pub use recaptcha::RecaptchaVerifier;

/// 人机验证抽象
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 校验客户端提交的 token。
    ///
    /// 仅当远端明确判定通过时返回 `true`；任何内部失败都返回 `false`，不会报错。
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool;
}

/// siteverify 接口响应
#[derive(Debug, Clone, Deserialize)]
pub struct SiteVerifyResponse {
    pub success: bool,
    #[serde(rename = "error-codes")]
    pub error_codes: Option<Vec<String>>,
    pub challenge_ts: Option<String>,
    pub hostname: Option<String>,
}

impl SiteVerifyResponse {
    /// `success == true` 且响应中没有 `error-codes` 字段才算通过
    pub fn is_accepted(&self) -> bool {
        self.success && self.error_codes.is_none()
    }
}
