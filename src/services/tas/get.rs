use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::TaService;
use crate::models::tas::responses::TaListResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_ta(
    service: &TaService,
    request: &HttpRequest,
    ta_id: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_ta_by_id(&ta_id).await {
        Ok(Some(ta)) => Ok(HttpResponse::Ok().json(ApiResponse::success(ta, "TA found"))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::TaNotFound, "TA not found!"))),
        Err(e) => {
            error!("Failed to get TA {}: {}", ta_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while fetching TA",
                )),
            )
        }
    }
}

pub async fn list_tas(service: &TaService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.list_tas().await {
        Ok(tas) => {
            let total = tas.len() as i64;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                TaListResponse { items: tas, total },
                "TA roster",
            )))
        }
        Err(e) => {
            error!("Failed to list TAs: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while listing TAs",
                )),
            )
        }
    }
}
