use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::config::AppConfig;
use crate::models::system::responses::SystemStatusResponse;
use crate::models::{ApiResponse, AppStartTime};

pub async fn status(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let uptime_seconds = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| {
            chrono::Utc::now()
                .signed_duration_since(start.start_datetime)
                .num_seconds()
        })
        .unwrap_or(0);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SystemStatusResponse {
            system_name: config.app.system_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: config.app.environment.clone(),
            uptime_seconds,
        },
        "System status",
    )))
}
