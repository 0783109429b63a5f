//! 错误响应与拒绝（Rejection）恢复

use std::convert::Infallible;

use serde::Serialize;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::error::AppError;

/// 携带业务错误的 warp 拒绝
#[derive(Debug)]
pub struct ApiRejection(pub AppError);

impl warp::reject::Reject for ApiRejection {}

impl From<AppError> for Rejection {
    fn from(err: AppError) -> Self {
        warp::reject::custom(ApiRejection(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Verification(_) => StatusCode::FORBIDDEN,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Database(_) | AppError::Config(_) | AppError::Server(_) | AppError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_reply(status: StatusCode, error: &'static str, message: String) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&ErrorBody { error, message }), status)
}

/// 将所有拒绝统一转换为 `{error, message}` JSON 响应
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if let Some(ApiRejection(app_err)) = err.find::<ApiRejection>() {
        let status = status_for(app_err);
        if app_err.is_recoverable() {
            log::debug!("请求失败 {}: {}", status, app_err);
        } else {
            log::error!("请求处理异常 {}: {}", status, app_err);
        }
        return Ok(error_reply(status, app_err.kind(), app_err.to_string()));
    }

    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "not_found", "路由不存在".to_string()));
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "validation",
            format!("请求体格式错误: {}", e),
        ));
    }

    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(error_reply(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "validation",
            "仅支持 JSON 或表单请求体".to_string(),
        ));
    }

    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "validation",
            "请求体过大".to_string(),
        ));
    }

    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "请求方法不被允许".to_string(),
        ));
    }

    log::error!("未处理的拒绝: {:?}", err);
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal",
        "服务器内部错误".to_string(),
    ))
}
