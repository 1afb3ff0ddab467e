//! 请求参数错误处理器
//!
//! JSON 体与查询串解析失败时返回统一响应结构，而不是
//! actix 默认的纯文本错误

use actix_web::{HttpRequest, HttpResponse, error::InternalError};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let message = format!("Invalid JSON payload: {err}");
    debug!("{}", message);
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidParams, message)),
    )
    .into()
}

pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    let message = format!("Invalid query parameters: {err}");
    debug!("{}", message);
    InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidParams, message)),
    )
    .into()
}
