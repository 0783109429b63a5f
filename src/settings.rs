//! 应用配置模块
//!
//! # 设计思路
//!
//! 配置来源分两层：JSON 设置文件（默认 `appsettings.json`）与环境变量覆盖。
//! 文件不存在时使用默认值；文件存在但无法解析时直接报错，避免静默使用错误配置。
//!
//! # 环境变量
//!
//! | 变量 | 覆盖字段 |
//! |------|----------|
//! | `CLIPBOARD_CONFIG` | 设置文件路径 |
//! | `RECAPTCHA_SITE_KEY` | `recaptcha.site_key` |
//! | `RECAPTCHA_SECRET_KEY` | `recaptcha.secret_key` |
//! | `RECAPTCHA_VERIFY_URL` | `recaptcha.verify_url` |
//! | `CONNECTION_STRING` | `connection_string` |
//! | `PORT` | `port` |

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_CONFIG_FILE: &str = "appsettings.json";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONNECTION_STRING: &str = "Data Source=clipboard.db";
pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// reCAPTCHA 相关配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecaptchaConfig {
    /// 前端控件使用的公开 site key
    pub site_key: String,
    /// 服务端校验使用的 secret key，不得下发给客户端
    pub secret_key: String,
    pub verify_url: String,
    /// 单次校验请求总超时（秒）
    pub timeout_secs: u64,
    /// 建立连接超时（秒）
    pub connect_timeout_secs: u64,
}

impl Default for RecaptchaConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret_key: String::new(),
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub recaptcha: RecaptchaConfig,
    pub connection_string: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recaptcha: RecaptchaConfig::default(),
            connection_string: DEFAULT_CONNECTION_STRING.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// 从默认位置加载配置并应用环境变量覆盖
    pub fn load() -> Result<Self, AppError> {
        let path = std::env::var("CLIPBOARD_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from_path(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 读取 JSON 设置文件；文件不存在时返回默认配置
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::info!("未找到设置文件 {}，使用默认配置", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::Config(format!("解析设置文件 {} 失败: {}", path.display(), e))
        })
    }

    /// 应用环境变量覆盖。`lookup` 抽象了变量来源，便于测试。
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), AppError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_empty("RECAPTCHA_SITE_KEY") {
            self.recaptcha.site_key = value;
        }
        if let Some(value) = non_empty("RECAPTCHA_SECRET_KEY") {
            self.recaptcha.secret_key = value;
        }
        if let Some(value) = non_empty("RECAPTCHA_VERIFY_URL") {
            self.recaptcha.verify_url = value;
        }
        if let Some(value) = non_empty("CONNECTION_STRING") {
            self.connection_string = value;
        }
        if let Some(value) = non_empty("PORT") {
            self.port = value.trim().parse().map_err(|e| {
                AppError::Config(format!("PORT 不是合法端口号 '{}': {}", value, e))
            })?;
        }
        Ok(())
    }

    /// 启动前的必要校验
    pub fn validate(&self) -> Result<(), AppError> {
        if self.recaptcha.secret_key.trim().is_empty() {
            return Err(AppError::Config("未配置 reCAPTCHA secret key".to_string()));
        }
        if self.recaptcha.timeout_secs == 0 || self.recaptcha.connect_timeout_secs == 0 {
            return Err(AppError::Config("reCAPTCHA 超时时间必须大于 0".to_string()));
        }
        if self.connection_string.trim().is_empty() {
            return Err(AppError::Config("数据库连接字符串为空".to_string()));
        }
        Ok(())
    }
}
