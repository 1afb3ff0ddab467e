use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ScheduleService;
use crate::cache::{self, ObjectCache};
use crate::models::schedules::entities::Schedule;
use crate::models::schedules::requests::UpdateScheduleRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduling::lifecycle;

/// 排班变更后的缓存维护：旧文档失效，新文档与最新 ID 回填
pub(crate) async fn refresh_schedule_cache(cache: &Arc<dyn ObjectCache>, schedule: &Schedule) {
    cache::insert_object(
        cache.as_ref(),
        &cache::schedule_cache_key(schedule.schedule_id),
        schedule,
        0,
    )
    .await;
    cache::insert_object(
        cache.as_ref(),
        cache::LATEST_SCHEDULE_ID_KEY,
        &schedule.schedule_id,
        0,
    )
    .await;
}

pub async fn update_schedule(
    service: &ScheduleService,
    request: &HttpRequest,
    schedule_id: i64,
    update: UpdateScheduleRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    // 状态变更必须走合法生命周期边
    if let Some(next) = update.state {
        let current = match storage.get_schedule_by_id(schedule_id).await {
            Ok(Some(schedule)) => schedule.state,
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::ScheduleNotFound,
                    format!("Cannot find schedule with id: {schedule_id}"),
                )));
            }
            Err(e) => {
                error!("Failed to get schedule {}: {}", schedule_id, e);
                return Ok(HttpResponse::InternalServerError().json(
                    ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        "Internal server error while fetching schedule",
                    ),
                ));
            }
        };
        if next != current && !lifecycle::can_transition(current, next) {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::IllegalTransition,
                format!("Cannot move schedule {schedule_id} from {current} to {next}"),
            )));
        }
    }

    match storage.merge_update_schedule(schedule_id, update).await {
        Ok(Some(schedule)) => {
            info!("Schedule {} merge-updated", schedule_id);
            refresh_schedule_cache(&cache, &schedule).await;
            Ok(HttpResponse::Ok()
                .json(ApiResponse::success(schedule, "Schedule updated successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ScheduleNotFound,
            format!("Cannot find schedule with id: {schedule_id}"),
        ))),
        Err(e) => {
            error!("Schedule update failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Schedule update failed: {e}"),
                )),
            )
        }
    }
}
