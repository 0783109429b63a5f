//! # 网页剪贴板 — 应用入口
//!
//! 本文件仅负责日志、配置、存储与验证客户端的初始化，
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::process::ExitCode;
use std::sync::Arc;

use web_clipboard::db::EntryStore;
use web_clipboard::error::AppError;
use web_clipboard::service::ClipboardService;
use web_clipboard::settings::AppConfig;
use web_clipboard::verification::RecaptchaVerifier;
use web_clipboard::web::{self, AppState};

async fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    log::info!("setup: config loaded, port={}", config.port);

    let store = Arc::new(EntryStore::open(&config.connection_string)?);
    log::info!("setup: db ready, {} entries", store.count()?);

    let verifier = Arc::new(RecaptchaVerifier::new(&config.recaptcha)?);
    if config.recaptcha.site_key.is_empty() {
        log::warn!("setup: 未配置 reCAPTCHA site key，前端控件将无法渲染");
    }

    let state = AppState {
        service: Arc::new(ClipboardService::new(store, verifier)),
        site_key: Arc::from(config.recaptcha.site_key.as_str()),
    };

    web::serve(state, config.port).await
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("启动失败: {err}");
            ExitCode::FAILURE
        }
    }
}
