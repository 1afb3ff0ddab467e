use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, error};

use super::ScheduleService;
use crate::cache::{self, ObjectCache};
use crate::errors::Result;
use crate::models::schedules::entities::Schedule;
use crate::models::schedules::responses::LatestScheduleResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 活动排班查找：缓存的最新 ID → 缓存的文档 → 存储回退
///
/// 没有显式 ID 时的文档化回退路径，查不到不算错误
pub(crate) async fn load_active_schedule(
    storage: &Arc<dyn Storage>,
    cache: &Arc<dyn ObjectCache>,
) -> Result<Option<Schedule>> {
    if let Some(latest_id) =
        cache::get_object::<i64>(cache.as_ref(), cache::LATEST_SCHEDULE_ID_KEY).await
        && let Some(schedule) =
            cache::get_object::<Schedule>(cache.as_ref(), &cache::schedule_cache_key(latest_id))
                .await
    {
        debug!("Active schedule {} served from cache", latest_id);
        return Ok(Some(schedule));
    }

    let schedule = storage.get_latest_schedule().await?;
    if let Some(ref schedule) = schedule {
        cache::insert_object(
            cache.as_ref(),
            cache::LATEST_SCHEDULE_ID_KEY,
            &schedule.schedule_id,
            0,
        )
        .await;
        cache::insert_object(
            cache.as_ref(),
            &cache::schedule_cache_key(schedule.schedule_id),
            schedule,
            0,
        )
        .await;
    }
    Ok(schedule)
}

pub async fn get_schedule(
    service: &ScheduleService,
    request: &HttpRequest,
    schedule_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    if let Some(schedule) =
        cache::get_object::<Schedule>(cache.as_ref(), &cache::schedule_cache_key(schedule_id)).await
    {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(schedule, "Schedule found")));
    }

    match storage.get_schedule_by_id(schedule_id).await {
        Ok(Some(schedule)) => {
            cache::insert_object(
                cache.as_ref(),
                &cache::schedule_cache_key(schedule_id),
                &schedule,
                0,
            )
            .await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(schedule, "Schedule found")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ScheduleNotFound,
            format!("Cannot find schedule with id: {schedule_id}"),
        ))),
        Err(e) => {
            error!("Failed to get schedule {}: {}", schedule_id, e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while fetching schedule",
                )),
            )
        }
    }
}

pub async fn get_latest_schedule(
    service: &ScheduleService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    match load_active_schedule(&storage, &cache).await {
        Ok(Some(schedule)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            LatestScheduleResponse {
                schedule_id: schedule.schedule_id,
            },
            "Latest schedule found",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::ScheduleNotFound,
            "No schedules found",
        ))),
        Err(e) => {
            error!("Failed to get latest schedule: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while fetching latest schedule",
                )),
            )
        }
    }
}
