use std::collections::BTreeSet;
use std::sync::Arc;

use crate::models::{
    schedules::{entities::Schedule, requests::UpdateScheduleRequest},
    tas::{
        entities::{PreferenceEntry, Ta},
        requests::CreateTaRequest,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 文档集合抽象：TA 与排班两个集合，按 ID 查找、按数值 ID 取最新、
/// 插入（原子替换）与字段级合并更新
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// TA 集合方法
    // 创建 TA
    async fn create_ta(&self, ta: CreateTaRequest) -> Result<Ta>;
    // 通过登录名获取 TA
    async fn get_ta_by_id(&self, ta_id: &str) -> Result<Option<Ta>>;
    // 全部 TA 名册
    async fn list_tas(&self) -> Result<Vec<Ta>>;
    // 整体替换一名 TA 的偏好向量（重试幂等，不追加）
    async fn replace_ta_preferences(
        &self,
        ta_id: &str,
        preferences: Vec<PreferenceEntry>,
    ) -> Result<bool>;
    // 整体替换一名 TA 的确认班次集合
    async fn replace_ta_confirmed_shifts(
        &self,
        ta_id: &str,
        confirmed_shifts: BTreeSet<String>,
    ) -> Result<bool>;

    /// 排班集合方法
    // 原子替换活动排班：同一事务内清空旧排班并插入新排班，
    // 不存在零排班窗口
    async fn replace_active_schedule(&self, schedule: Schedule) -> Result<Schedule>;
    // 通过 ID 获取排班
    async fn get_schedule_by_id(&self, schedule_id: i64) -> Result<Option<Schedule>>;
    // 获取数值 ID 最大的排班（活动排班的回退查找路径）
    async fn get_latest_schedule(&self) -> Result<Option<Schedule>>;
    // 字段级合并更新（只覆盖请求中出现的字段）
    async fn merge_update_schedule(
        &self,
        schedule_id: i64,
        update: UpdateScheduleRequest,
    ) -> Result<Option<Schedule>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
