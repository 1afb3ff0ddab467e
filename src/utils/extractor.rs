//! 路径参数提取器
//!
//! 在进入业务逻辑前完成路径参数的解析与格式校验，
//! 非法参数直接以统一响应结构返回 400

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};

use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_ta_id;

fn bad_request(message: &str) -> actix_web::Error {
    InternalError::from_response(
        message.to_string(),
        HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidParams, message)),
    )
    .into()
}

/// 安全的排班 ID 路径参数（正整数）
pub struct SafeScheduleIdI64(pub i64);

impl FromRequest for SafeScheduleIdI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let parsed = req
            .match_info()
            .get("schedule_id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0);

        ready(match parsed {
            Some(id) => Ok(SafeScheduleIdI64(id)),
            None => Err(bad_request("Param sent is invalid")),
        })
    }
}

/// 安全的 TA 登录名路径参数
pub struct SafeTaId(pub String);

impl FromRequest for SafeTaId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("ta_id").unwrap_or_default();

        ready(match validate_ta_id(raw) {
            Ok(()) => Ok(SafeTaId(raw.to_string())),
            Err(msg) => Err(bad_request(msg)),
        })
    }
}
