use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::DispatchService;
use crate::models::schedules::responses::AlgorithmInputResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::scheduling::time_grid::WorkInterval;
use crate::scheduling::{contract, preference};
use crate::services::schedules::get::load_active_schedule;

/// 导出算法输入
///
/// 把每个 TA 的偏好绑定到活动排班的班次并持久化绑定结果，
/// 返回 {tas, schedule} 快照。算法进程不经请求体拿数据，
/// 而是从共享存储读取同一份状态
pub async fn algorithm_input(
    service: &DispatchService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);

    let schedule = match load_active_schedule(&storage, &cache).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ScheduleNotFound,
                "No schedules found",
            )));
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
    };

    let mut tas = match storage.list_tas().await {
        Ok(tas) => tas,
        Err(e) => {
            error!("Failed to list TAs: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Internal server error while listing TAs",
                )),
            );
        }
    };

    // 算法假定每个 TA 的偏好向量是稠密的：未声明的时段补不可用
    let interval = match WorkInterval::from_schedule(&schedule) {
        Ok(interval) => interval,
        Err(e) => {
            error!("Active schedule carries a corrupt interval: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Active schedule configuration is corrupt",
                )),
            );
        }
    };
    for ta in &mut tas {
        ta.preferences = preference::densify(&ta.preferences, &interval);
    }

    let resolved = match contract::resolve_shift_ids(&schedule, &mut tas) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("Shift id resolution failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    e.format_simple(),
                )),
            );
        }
    };

    // 绑定结果落库，算法进程读到的偏好已带 shift_id
    for ta in &tas {
        if let Err(e) = storage
            .replace_ta_preferences(&ta.ta_id, ta.preferences.clone())
            .await
        {
            error!("Failed to persist resolved preferences for {}: {}", ta.ta_id, e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to persist resolved preferences: {e}"),
                )),
            );
        }
    }

    info!(
        "Algorithm input snapshot: schedule {}, {} TAs, {} preferences resolved",
        schedule.schedule_id,
        tas.len(),
        resolved
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AlgorithmInputResponse { tas, schedule },
        "Algorithm input snapshot",
    )))
}
