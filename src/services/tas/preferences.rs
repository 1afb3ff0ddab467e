use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::TaService;
use crate::errors::SchedulerError;
use crate::models::tas::requests::SubmitPreferencesRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduling::preference;
use crate::scheduling::time_grid::WorkInterval;
use crate::services::schedules::get::load_active_schedule;

pub async fn submit_preferences(
    service: &TaService,
    request: &HttpRequest,
    ta_id: String,
    data: SubmitPreferencesRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    // 整批解码，任一条目非法则整批拒绝，不落任何数据
    let mut entries = Vec::with_capacity(data.preferences.len());
    for raw in &data.preferences {
        match preference::decode(raw) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::MalformedPreference,
                    e.message().to_string(),
                )));
            }
        }
    }

    // 已有活动排班时执行严格的网格对齐校验；对不齐的时段永远
    // 绑不上班次，提交阶段就拒绝
    match load_active_schedule(&storage, &cache).await {
        Ok(Some(schedule)) => match WorkInterval::from_schedule(&schedule) {
            Ok(interval) => {
                for entry in &entries {
                    if let Err(e) = preference::validate_alignment(entry, &interval) {
                        let code = match e {
                            SchedulerError::UnalignedSlot(_) => ErrorCode::UnalignedSlot,
                            _ => ErrorCode::MalformedPreference,
                        };
                        return Ok(HttpResponse::BadRequest()
                            .json(ApiResponse::error_empty(code, e.message().to_string())));
                    }
                }
            }
            Err(e) => {
                error!("Active schedule carries a corrupt interval: {}", e);
                return Ok(HttpResponse::InternalServerError().json(
                    ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        "Active schedule configuration is corrupt",
                    ),
                ));
            }
        },
        Ok(None) => {
            // 还没有排班网格，只做格式校验
        }
        Err(e) => {
            error!("Failed to load active schedule: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while loading active schedule",
                )),
            );
        }
    }

    // 整体替换该 TA 的偏好向量（重试幂等，不累积重复条目）
    match storage.replace_ta_preferences(&ta_id, entries).await {
        Ok(true) => {
            info!(
                "Preferences for TA {} replaced ({} entries)",
                ta_id,
                data.preferences.len()
            );
            Ok(HttpResponse::Ok()
                .json(ApiResponse::success_empty("TA preferences replaced successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::TaNotFound, "TA not found!"))),
        Err(e) => {
            error!("Failed to replace preferences for {}: {}", ta_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to replace preferences: {e}"),
                )),
            )
        }
    }
}
