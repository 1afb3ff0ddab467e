pub mod status;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

pub struct SystemService;

impl SystemService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 系统状态
    pub async fn status(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        status::status(request).await
    }
}
