pub mod get;
pub mod init;
pub mod template;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::models::schedules::requests::{
    ApplyTemplateRequest, InitScheduleRequest, UpdateScheduleRequest,
};
use crate::storage::Storage;

pub struct ScheduleService {
    storage: Option<Arc<dyn Storage>>,
}

impl ScheduleService {
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

    // 初始化排班（原子替换活动排班）
    pub async fn init_schedule(
        &self,
        request: &HttpRequest,
        data: InitScheduleRequest,
    ) -> ActixResult<HttpResponse> {
        init::init_schedule(self, request, data).await
    }

    // 根据 ID 获取排班
    pub async fn get_schedule(
        &self,
        request: &HttpRequest,
        schedule_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_schedule(self, request, schedule_id).await
    }

    // 获取最新排班 ID
    pub async fn get_latest_schedule(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_latest_schedule(self, request).await
    }

    // 字段级合并更新
    pub async fn update_schedule(
        &self,
        request: &HttpRequest,
        schedule_id: i64,
        update: UpdateScheduleRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_schedule(self, request, schedule_id, update).await
    }

    // 应用角色需求模板
    pub async fn apply_template(
        &self,
        request: &HttpRequest,
        schedule_id: i64,
        data: ApplyTemplateRequest,
    ) -> ActixResult<HttpResponse> {
        template::apply_template(self, request, schedule_id, data).await
    }
}
