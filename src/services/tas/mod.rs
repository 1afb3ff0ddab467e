pub mod create;
pub mod get;
pub mod preferences;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::models::tas::requests::{CreateTaRequest, SubmitPreferencesRequest};
use crate::storage::Storage;

pub struct TaService {
    storage: Option<Arc<dyn Storage>>,
}

impl TaService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_cache(&self, request: &HttpRequest) -> Arc<dyn ObjectCache> {
        request
            .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
            .expect("Cache not found in app data")
            .get_ref()
            .clone()
    }

    // 创建 TA
    pub async fn create_ta(
        &self,
        request: &HttpRequest,
        data: CreateTaRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_ta(self, request, data).await
    }

    // 根据登录名获取 TA
    pub async fn get_ta(&self, request: &HttpRequest, ta_id: String) -> ActixResult<HttpResponse> {
        get::get_ta(self, request, ta_id).await
    }

    // 全部 TA 名册
    pub async fn list_tas(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::list_tas(self, request).await
    }

    // 整批校验并整体替换偏好向量
    pub async fn submit_preferences(
        &self,
        request: &HttpRequest,
        ta_id: String,
        data: SubmitPreferencesRequest,
    ) -> ActixResult<HttpResponse> {
        preferences::submit_preferences(self, request, ta_id, data).await
    }
}
