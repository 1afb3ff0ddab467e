use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ScheduleService;
use super::update::refresh_schedule_cache;
use crate::models::schedules::requests::{ApplyTemplateRequest, UpdateScheduleRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduling::catalog;

pub async fn apply_template(
    service: &ScheduleService,
    request: &HttpRequest,
    schedule_id: i64,
    data: ApplyTemplateRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    let mut schedule = match storage.get_schedule_by_id(schedule_id).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ScheduleNotFound,
                format!("Cannot find schedule with id: {schedule_id}"),
            )));
        }
        Err(e) => {
            error!("Failed to get schedule {}: {}", schedule_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while fetching schedule",
                )),
            );
        }
    };

    if let Err(e) = catalog::apply_template(&mut schedule, &data.slots) {
        error!("Template application failed: {}", e);
        return Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                e.format_simple(),
            )),
        );
    }

    // 只写回七个天数组，配置字段保持不动
    let update = UpdateScheduleRequest::replace_days(&schedule);
    match storage.merge_update_schedule(schedule_id, update).await {
        Ok(Some(schedule)) => {
            info!(
                "Template applied to schedule {} ({} role slots)",
                schedule_id,
                data.slots.len()
            );
            refresh_schedule_cache(&cache, &schedule).await;
            Ok(HttpResponse::Ok()
                .json(ApiResponse::success(schedule, "Template applied successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ScheduleNotFound,
            format!("Cannot find schedule with id: {schedule_id}"),
        ))),
        Err(e) => {
            error!("Template application failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Template application failed: {e}"),
                )),
            )
        }
    }
}
