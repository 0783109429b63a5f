//! # HTTP 入口模块
//!
//! ## 设计思路
//!
//! 使用 `warp` Filter 将请求映射到 `ClipboardService` 的五个操作，
//! 只负责参数提取与响应序列化，不承载任何业务逻辑。
//!
//! ## 路由
//!
//! | 方法与路径 | 操作 | 成功响应 |
//! |------------|------|----------|
//! | `GET /clipboard` | list | 200 条目数组 |
//! | `GET /clipboard/{id}` | get | 200 条目 |
//! | `POST /clipboard` | create（JSON 或表单） | 201 条目 |
//! | `PUT /clipboard/{id}` | update（JSON 或表单） | 200 条目 |
//! | `DELETE /clipboard/{id}` | delete | 204 |
//! | `GET /recaptcha/site-key` | 下发公开 site key | 200 `{site_key}` |

mod response;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::AppError;
use crate::service::{ClipboardService, CreateEntryRequest, UpdateEntryRequest};

pub use response::{handle_rejection, status_for, ApiRejection, ErrorBody};

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClipboardService>,
    pub site_key: Arc<str>,
}

#[derive(Debug, Serialize)]
struct SiteKeyBody<'a> {
    site_key: &'a str,
}

/// 注入共享状态
fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// 表单请求体的字段修正
///
/// 浏览器提交空输入框时会带上 `alias=`，表单里的空白 alias 视为未填写。
/// JSON 请求体原样保留。
trait FormBody {
    fn blank_alias_as_none(self) -> Self;
}

fn blank_to_none(alias: Option<String>) -> Option<String> {
    alias.filter(|alias| !alias.trim().is_empty())
}

impl FormBody for CreateEntryRequest {
    fn blank_alias_as_none(mut self) -> Self {
        self.alias = blank_to_none(self.alias);
        self
    }
}

impl FormBody for UpdateEntryRequest {
    fn blank_alias_as_none(mut self) -> Self {
        self.alias = blank_to_none(self.alias);
        self
    }
}

/// 同时接受 JSON 与 `application/x-www-form-urlencoded` 请求体
fn json_or_form<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: FormBody + DeserializeOwned + Send + 'static,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(
        warp::body::json::<T>()
            .or(warp::body::form::<T>().map(|request: T| request.blank_alias_as_none()))
            .unify(),
    )
}

/// 组装全部路由（含拒绝恢复与访问日志）
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let list = warp::path!("clipboard")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_list);

    let get = warp::path!("clipboard" / i64)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handle_get);

    let create = warp::path!("clipboard")
        .and(warp::post())
        .and(warp::addr::remote())
        .and(json_or_form::<CreateEntryRequest>())
        .and(with_state(state.clone()))
        .and_then(handle_create);

    let update = warp::path!("clipboard" / i64)
        .and(warp::put())
        .and(json_or_form::<UpdateEntryRequest>())
        .and(with_state(state.clone()))
        .and_then(handle_update);

    let delete = warp::path!("clipboard" / i64)
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and_then(handle_delete);

    let site_key = warp::path!("recaptcha" / "site-key")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: AppState| warp::reply::json(&SiteKeyBody { site_key: &state.site_key }));

    list.or(get)
        .or(create)
        .or(update)
        .or(delete)
        .or(site_key)
        .recover(handle_rejection)
        .with(warp::log("web_clipboard::http"))
}

async fn handle_list(state: AppState) -> Result<impl Reply, Rejection> {
    let entries = state.service.list()?;
    Ok(warp::reply::json(&entries))
}

async fn handle_get(id: i64, state: AppState) -> Result<impl Reply, Rejection> {
    let entry = state.service.get(id)?;
    Ok(warp::reply::json(&entry))
}

async fn handle_create(
    remote: Option<SocketAddr>,
    request: CreateEntryRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let remote_ip = remote.map(|addr| addr.ip().to_string());
    let entry = state.service.create(request, remote_ip.as_deref()).await?;
    Ok(warp::reply::with_status(warp::reply::json(&entry), StatusCode::CREATED))
}

async fn handle_update(
    id: i64,
    request: UpdateEntryRequest,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let entry = state.service.update(id, request)?;
    Ok(warp::reply::json(&entry))
}

async fn handle_delete(id: i64, state: AppState) -> Result<impl Reply, Rejection> {
    state.service.delete(id)?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

/// 在 `0.0.0.0:{port}` 启动 HTTP 服务，收到 Ctrl-C 后优雅退出
pub async fn serve(state: AppState, port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::warn!("监听退出信号失败: {err}");
        }
        log::info!("收到退出信号，正在停止 HTTP 服务");
    };

    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| AppError::Server(format!("监听 {} 失败: {}", addr, e)))?;

    log::info!("HTTP 服务已启动: http://{}", bound);
    server.await;
    log::info!("HTTP 服务已停止");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use warp::http::StatusCode;

    use super::{routes, AppState};
    use crate::db::{ClipboardEntry, EntryStore};
    use crate::service::ClipboardService;
    use crate::verification::TokenVerifier;

    struct AcceptValid;

    #[async_trait]
    impl TokenVerifier for AcceptValid {
        async fn verify(&self, token: &str, _remote_ip: Option<&str>) -> bool {
            token == "valid"
        }
    }

    fn state() -> AppState {
        let store = Arc::new(EntryStore::open_in_memory().expect("open store"));
        AppState {
            service: Arc::new(ClipboardService::new(store, Arc::new(AcceptValid))),
            site_key: Arc::from("public-site-key"),
        }
    }

    fn error_kind(body: &[u8]) -> String {
        let value: serde_json::Value = serde_json::from_slice(body).expect("parse error body");
        value["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn create_accepts_form_body_with_widget_field() {
        let api = routes(state());

        let res = warp::test::request()
            .method("POST")
            .path("/clipboard")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("alias=memo&content=hello+world&g-recaptcha-response=valid")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::CREATED);
        let entry: ClipboardEntry = serde_json::from_slice(res.body()).expect("parse entry");
        assert_eq!(entry.alias.as_deref(), Some("memo"));
        assert_eq!(entry.content, "hello world");
    }

    #[tokio::test]
    async fn empty_form_alias_is_unset_but_json_alias_is_kept() {
        let api = routes(state());

        let form = warp::test::request()
            .method("POST")
            .path("/clipboard")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("alias=&content=from+form&g-recaptcha-response=valid")
            .reply(&api)
            .await;
        assert_eq!(form.status(), StatusCode::CREATED);
        let entry: ClipboardEntry = serde_json::from_slice(form.body()).expect("parse entry");
        assert_eq!(entry.alias, None);

        let json = warp::test::request()
            .method("POST")
            .path("/clipboard")
            .json(&serde_json::json!({ "alias": " ", "content": "from json", "token": "valid" }))
            .reply(&api)
            .await;
        assert_eq!(json.status(), StatusCode::CREATED);
        let entry: ClipboardEntry = serde_json::from_slice(json.body()).expect("parse entry");
        assert_eq!(entry.alias.as_deref(), Some(" "));

        let edited = warp::test::request()
            .method("PUT")
            .path(&format!("/clipboard/{}", entry.id))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(format!("id={}&alias=++&content=edited", entry.id))
            .reply(&api)
            .await;
        assert_eq!(edited.status(), StatusCode::OK);
        let entry: ClipboardEntry = serde_json::from_slice(edited.body()).expect("parse entry");
        assert_eq!(entry.alias, None);
    }

    #[tokio::test]
    async fn create_with_rejected_token_is_forbidden() {
        let api = routes(state());

        let res = warp::test::request()
            .method("POST")
            .path("/clipboard")
            .json(&serde_json::json!({ "content": "hi", "token": "nope" }))
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_kind(res.body()), "verification");
    }

    #[tokio::test]
    async fn update_conflict_and_missing_ids_map_to_statuses() {
        let api = routes(state());

        let created = warp::test::request()
            .method("POST")
            .path("/clipboard")
            .json(&serde_json::json!({ "content": "v0", "token": "valid" }))
            .reply(&api)
            .await;
        assert_eq!(created.status(), StatusCode::CREATED);

        let first = warp::test::request()
            .method("PUT")
            .path("/clipboard/1")
            .json(&serde_json::json!({ "id": 1, "content": "v1", "version": 0 }))
            .reply(&api)
            .await;
        assert_eq!(first.status(), StatusCode::OK);

        let stale = warp::test::request()
            .method("PUT")
            .path("/clipboard/1")
            .json(&serde_json::json!({ "id": 1, "content": "lost", "version": 0 }))
            .reply(&api)
            .await;
        assert_eq!(stale.status(), StatusCode::CONFLICT);
        assert_eq!(error_kind(stale.body()), "conflict");

        let mismatch = warp::test::request()
            .method("PUT")
            .path("/clipboard/1")
            .json(&serde_json::json!({ "id": 2, "content": "x" }))
            .reply(&api)
            .await;
        assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);

        let missing = warp::test::request()
            .method("PUT")
            .path("/clipboard/9")
            .json(&serde_json::json!({ "id": 9, "content": "x" }))
            .reply(&api)
            .await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_kind(missing.body()), "not_found");
    }

    #[tokio::test]
    async fn delete_is_no_content_even_when_absent() {
        let api = routes(state());

        for _ in 0..2 {
            let res = warp::test::request()
                .method("DELETE")
                .path("/clipboard/7")
                .reply(&api)
                .await;
            assert_eq!(res.status(), StatusCode::NO_CONTENT);
        }
    }

    #[tokio::test]
    async fn site_key_is_exposed_but_secret_is_not() {
        let api = routes(state());

        let res = warp::test::request()
            .method("GET")
            .path("/recaptcha/site-key")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(res.body()).expect("parse body");
        assert_eq!(value["site_key"], "public-site-key");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let api = routes(state());

        let res = warp::test::request()
            .method("POST")
            .path("/clipboard")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&api)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_kind(res.body()), "validation");
    }
}
