//! Google reCAPTCHA siteverify 客户端
//!
//! 请求：`POST {verify_url}`，表单字段 `secret` / `response` / 可选 `remoteip`。
//! 超时：总超时 + 连接超时，均来自 `RecaptchaConfig`。
//! 重试：网络瞬时错误或 408/429/5xx 时重试一次。

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;
use crate::settings::RecaptchaConfig;

use super::{SiteVerifyResponse, TokenVerifier};

const VERIFY_MAX_ATTEMPTS: u8 = 2;
const VERIFY_RETRY_DELAY: Duration = Duration::from_millis(200);

/// 单次校验请求的内部失败原因，只用于日志与重试判断
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("请求失败：{0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP 状态异常：{0}")]
    Status(reqwest::StatusCode),

    #[error("响应解析失败：{0}")]
    Parse(#[from] serde_json::Error),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Network(err) => is_retryable_network_error(err),
            AttemptError::Status(status) => is_retryable_http_status(*status),
            AttemptError::Parse(_) => false,
        }
    }
}

fn is_retryable_http_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn is_retryable_network_error(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }

    // reqwest 只在顶层给出 "error sending request"，断连原因在 source 链里
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(error);
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
            if is_transient_io_kind(io_err.kind()) {
                return true;
            }
        }

        let msg = err.to_string().to_lowercase();
        if msg.contains("connection reset")
            || msg.contains("connection closed before message completed")
            || msg.contains("peer closed connection")
        {
            return true;
        }
        source = err.source();
    }
    false
}

fn is_transient_io_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof
    )
}

/// 基于 reqwest 的 reCAPTCHA 校验器
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret_key: String,
}

impl RecaptchaVerifier {
    pub fn new(config: &RecaptchaConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn send_once(&self, token: &str, remote_ip: Option<&str>) -> Result<SiteVerifyResponse, AttemptError> {
        let mut form = vec![("secret", self.secret_key.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self.client.post(&self.verify_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TokenVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        let mut attempt: u8 = 1;
        loop {
            match self.send_once(token, remote_ip).await {
                Ok(body) => {
                    if body.is_accepted() {
                        log::debug!("reCAPTCHA 校验通过 hostname={:?}", body.hostname);
                        return true;
                    }
                    log::info!(
                        "reCAPTCHA 校验未通过 success={} error-codes={:?}",
                        body.success,
                        body.error_codes
                    );
                    return false;
                }
                Err(err) => {
                    if attempt >= VERIFY_MAX_ATTEMPTS || !err.is_retryable() {
                        log::warn!(
                            "reCAPTCHA 校验失败（第 {}/{} 次），按未通过处理：{}",
                            attempt,
                            VERIFY_MAX_ATTEMPTS,
                            err
                        );
                        return false;
                    }

                    log::warn!(
                        "reCAPTCHA 校验失败（第 {}/{} 次，可重试）：{}；{}ms 后重试",
                        attempt,
                        VERIFY_MAX_ATTEMPTS,
                        err,
                        VERIFY_RETRY_DELAY.as_millis()
                    );
                    tokio::time::sleep(VERIFY_RETRY_DELAY).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
