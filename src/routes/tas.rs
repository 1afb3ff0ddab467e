use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::tas::requests::{CreateTaRequest, SubmitPreferencesRequest};
use crate::services::TaService;
use crate::utils::SafeTaId;

// 懒加载的全局 TA_SERVICE 实例
static TA_SERVICE: Lazy<TaService> = Lazy::new(TaService::new_lazy);

// HTTP处理程序
pub async fn create_ta(
    req: HttpRequest,
    data: web::Json<CreateTaRequest>,
) -> ActixResult<HttpResponse> {
    TA_SERVICE.create_ta(&req, data.into_inner()).await
}

pub async fn list_tas(req: HttpRequest) -> ActixResult<HttpResponse> {
    TA_SERVICE.list_tas(&req).await
}

pub async fn get_ta(req: HttpRequest, ta_id: SafeTaId) -> ActixResult<HttpResponse> {
    TA_SERVICE.get_ta(&req, ta_id.0).await
}

pub async fn submit_preferences(
    req: HttpRequest,
    ta_id: SafeTaId,
    data: web::Json<SubmitPreferencesRequest>,
) -> ActixResult<HttpResponse> {
    TA_SERVICE
        .submit_preferences(&req, ta_id.0, data.into_inner())
        .await
}

// 配置路由
pub fn configure_tas_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/tas")
            .service(
                web::resource("")
                    // TF 查看名册
                    .route(web::get().to(list_tas))
                    // 首次提交时创建 TA
                    .route(web::post().to(create_ta)),
            )
            .service(web::resource("/{ta_id}").route(web::get().to(get_ta)))
            .service(
                // 整批校验后整体替换偏好向量（重试幂等）
                web::resource("/{ta_id}/preferences").route(web::put().to(submit_preferences)),
            ),
    );
}
