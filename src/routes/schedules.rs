use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::schedules::requests::{
    ApplyTemplateRequest, InitScheduleRequest, UpdateScheduleRequest,
};
use crate::services::{DispatchService, ScheduleService};
use crate::utils::SafeScheduleIdI64;

// 懒加载的全局服务实例
static SCHEDULE_SERVICE: Lazy<ScheduleService> = Lazy::new(ScheduleService::new_lazy);
static DISPATCH_SERVICE: Lazy<DispatchService> = Lazy::new(DispatchService::new_lazy);

// HTTP处理程序
pub async fn init_schedule(
    req: HttpRequest,
    data: web::Json<InitScheduleRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .init_schedule(&req, data.into_inner())
        .await
}

pub async fn get_latest_schedule(req: HttpRequest) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.get_latest_schedule(&req).await
}

pub async fn get_schedule(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.get_schedule(&req, schedule_id.0).await
}

pub async fn update_schedule(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
    update: web::Json<UpdateScheduleRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .update_schedule(&req, schedule_id.0, update.into_inner())
        .await
}

pub async fn apply_template(
    req: HttpRequest,
    schedule_id: SafeScheduleIdI64,
    data: web::Json<ApplyTemplateRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .apply_template(&req, schedule_id.0, data.into_inner())
        .await
}

pub async fn algorithm_input(req: HttpRequest) -> ActixResult<HttpResponse> {
    DISPATCH_SERVICE.algorithm_input(&req).await
}

pub async fn run_algorithm(req: HttpRequest) -> ActixResult<HttpResponse> {
    DISPATCH_SERVICE.run_algorithm(&req).await
}

// 配置路由
pub fn configure_schedules_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/schedules")
            .service(
                // TF 初始化排班（原子替换活动排班）
                web::resource("").route(web::post().to(init_schedule)),
            )
            .service(
                // 没有显式 ID 时的回退查找
                web::resource("/latest").route(web::get().to(get_latest_schedule)),
            )
            .service(
                // 导出算法输入快照（偏好绑定结果落库）
                web::resource("/algorithm-input").route(web::get().to(algorithm_input)),
            )
            .service(
                // 触发外部分配算法：调度 → 校验 → 写回
                web::resource("/dispatch").route(web::post().to(run_algorithm)),
            )
            .service(
                web::resource("/{schedule_id}")
                    .route(web::get().to(get_schedule))
                    // 字段级合并更新，未提供的字段保持不动
                    .route(web::put().to(update_schedule)),
            )
            .service(
                // TF 的角色需求模板
                web::resource("/{schedule_id}/template").route(web::post().to(apply_template)),
            ),
    );
}
