pub mod export;
pub mod run;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::storage::Storage;

pub struct DispatchService {
    storage: Option<Arc<dyn Storage>>,
}

impl DispatchService {
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

    // 算法输入快照（偏好绑定后的 TA 全集 + 活动排班）
    pub async fn algorithm_input(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        export::algorithm_input(self, request).await
    }

    // 调度外部分配算法并校验/写回结果
    pub async fn run_algorithm(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        run::run_algorithm(self, request).await
    }
}
