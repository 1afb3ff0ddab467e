//! TA 存储操作

use std::collections::BTreeSet;

use super::SeaOrmStorage;
use crate::entity::tas::{ActiveModel, Column, Entity as Tas};
use crate::errors::{Result, SchedulerError};
use crate::models::tas::{
    entities::{PreferenceEntry, Ta},
    requests::CreateTaRequest,
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建 TA
    pub async fn create_ta_impl(&self, req: CreateTaRequest) -> Result<Ta> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            ta_id: Set(req.ta_id),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            is_tf: Set(req.is_tf),
            lab_perm: Set(req.lab_perm.as_int() as i32),
            preferences: Set(serde_json::json!([])),
            confirmed_shifts: Set(serde_json::json!([])),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("创建 TA 失败: {e}")))?;

        result.into_ta()
    }

    /// 通过登录名获取 TA
    pub async fn get_ta_by_id_impl(&self, ta_id: &str) -> Result<Option<Ta>> {
        let result = Tas::find_by_id(ta_id)
            .one(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("查询 TA 失败: {e}")))?;

        result.map(|m| m.into_ta()).transpose()
    }

    /// 全部 TA 名册（按登录名排序）
    pub async fn list_tas_impl(&self) -> Result<Vec<Ta>> {
        let rows = Tas::find()
            .order_by_asc(Column::TaId)
            .all(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("查询 TA 名册失败: {e}")))?;

        rows.into_iter().map(|m| m.into_ta()).collect()
    }

    /// 整体替换偏好向量（不追加，重复提交幂等）
    pub async fn replace_ta_preferences_impl(
        &self,
        ta_id: &str,
        preferences: Vec<PreferenceEntry>,
    ) -> Result<bool> {
        // 先检查 TA 是否存在
        let existing = self.get_ta_by_id_impl(ta_id).await?;
        if existing.is_none() {
            return Ok(false);
        }

        let model = ActiveModel {
            ta_id: Set(ta_id.to_string()),
            preferences: Set(serde_json::to_value(&preferences)?),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("更新 TA 偏好失败: {e}")))?;

        Ok(true)
    }

    /// 整体替换确认班次集合
    pub async fn replace_ta_confirmed_shifts_impl(
        &self,
        ta_id: &str,
        confirmed_shifts: BTreeSet<String>,
    ) -> Result<bool> {
        let existing = self.get_ta_by_id_impl(ta_id).await?;
        if existing.is_none() {
            return Ok(false);
        }

        let model = ActiveModel {
            ta_id: Set(ta_id.to_string()),
            confirmed_shifts: Set(serde_json::to_value(&confirmed_shifts)?),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| {
                SchedulerError::database_operation(format!("更新 TA 确认班次失败: {e}"))
            })?;

        Ok(true)
    }
}
