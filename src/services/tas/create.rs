use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::TaService;
use crate::models::tas::requests::CreateTaRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::{validate_person_name, validate_ta_id};

pub async fn create_ta(
    service: &TaService,
    request: &HttpRequest,
    data: CreateTaRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    // 入参校验
    if let Err(msg) = validate_ta_id(&data.ta_id) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidParams, msg)));
    }
    if let Err(msg) = validate_person_name(&data.first_name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidParams, msg)));
    }
    if let Err(msg) = validate_person_name(&data.last_name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidParams, msg)));
    }

    // 登录名唯一
    match storage.get_ta_by_id(&data.ta_id).await {
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::TaAlreadyExists,
                format!("TA '{}' already exists", data.ta_id),
            )));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check TA existence: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while checking TA",
                )),
            );
        }
    }

    match storage.create_ta(data).await {
        Ok(ta) => {
            info!(
                "TA {} created successfully (lab_perm={}, is_tf={})",
                ta.ta_id, ta.lab_perm, ta.is_tf
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(ta, "TA created successfully")))
        }
        Err(e) => {
            error!("TA creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("TA creation failed: {e}"),
                )),
            )
        }
    }
}
