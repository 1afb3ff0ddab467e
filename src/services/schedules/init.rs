use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ScheduleService;
use crate::cache;
use crate::models::schedules::entities::ScheduleState;
use crate::models::schedules::requests::InitScheduleRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduling::{catalog, lifecycle, time_grid::WorkInterval};

pub async fn init_schedule(
    service: &ScheduleService,
    request: &HttpRequest,
    data: InitScheduleRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    // 区间校验先于任何网格生成
    let interval = match WorkInterval::parse(
        &data.start_interval_time,
        &data.end_interval_time,
        data.shift_duration,
    ) {
        Ok(interval) => interval,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::InvalidInterval,
                e.format_simple(),
            )));
        }
    };

    // 单写者假设下，新 ID 取最新 ID + 1
    let next_id = match storage.get_latest_schedule().await {
        Ok(Some(previous)) => previous.schedule_id + 1,
        Ok(None) => 1,
        Err(e) => {
            error!("Failed to look up latest schedule: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while looking up latest schedule",
                )),
            );
        }
    };

    let mut schedule = catalog::generate(next_id, &interval, data.staffing_capacity);
    info!(
        "Generated schedule {} with {} shifts per day ({} total)",
        next_id,
        interval.count_slots(),
        schedule.total_shifts()
    );

    // 产生了班次才算 Populated；end <= start 的区间停留在 Drafted
    if schedule.total_shifts() > 0
        && let Err(e) = lifecycle::transition(&mut schedule, ScheduleState::Populated)
    {
        error!("Unexpected lifecycle failure on init: {}", e);
        return Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                e.format_simple(),
            )),
        );
    }

    match storage.replace_active_schedule(schedule).await {
        Ok(schedule) => {
            info!(
                "Schedule {} is now the active schedule (state: {})",
                schedule.schedule_id, schedule.state
            );
            cache.remove(cache::LATEST_SCHEDULE_ID_KEY).await;
            cache::insert_object(
                cache.as_ref(),
                &cache::schedule_cache_key(schedule.schedule_id),
                &schedule,
                0,
            )
            .await;
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(schedule, "Schedule created successfully")))
        }
        Err(e) => {
            error!("Schedule creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Schedule creation failed: {e}"),
                )),
            )
        }
    }
}
