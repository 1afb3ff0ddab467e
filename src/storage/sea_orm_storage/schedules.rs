//! 排班存储操作

use super::SeaOrmStorage;
use crate::entity::schedules::{ActiveModel, Column, Entity as Schedules};
use crate::errors::{Result, SchedulerError};
use crate::models::schedules::{entities::Schedule, requests::UpdateScheduleRequest};
use crate::scheduling::catalog;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};

fn to_active_model(schedule: &Schedule) -> Result<ActiveModel> {
    Ok(ActiveModel {
        schedule_id: Set(schedule.schedule_id),
        start_interval_time: Set(schedule.start_interval_time.clone()),
        end_interval_time: Set(schedule.end_interval_time.clone()),
        shift_duration: Set(schedule.shift_duration as i32),
        state: Set(schedule.state.to_string()),
        monday: Set(serde_json::to_value(&schedule.monday)?),
        tuesday: Set(serde_json::to_value(&schedule.tuesday)?),
        wednesday: Set(serde_json::to_value(&schedule.wednesday)?),
        thursday: Set(serde_json::to_value(&schedule.thursday)?),
        friday: Set(serde_json::to_value(&schedule.friday)?),
        saturday: Set(serde_json::to_value(&schedule.saturday)?),
        sunday: Set(serde_json::to_value(&schedule.sunday)?),
        created_at: Set(schedule.created_at.timestamp()),
        updated_at: Set(schedule.updated_at.timestamp()),
    })
}

impl SeaOrmStorage {
    /// 原子替换活动排班
    ///
    /// 删除旧排班与插入新排班在同一事务内完成，任何时刻都不会
    /// 出现零排班窗口
    pub async fn replace_active_schedule_impl(&self, schedule: Schedule) -> Result<Schedule> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SchedulerError::database_operation(format!("开启事务失败: {e}")))?;

        Schedules::delete_many()
            .exec(&txn)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("清理旧排班失败: {e}")))?;

        to_active_model(&schedule)?
            .insert(&txn)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("插入排班失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| SchedulerError::database_operation(format!("提交排班事务失败: {e}")))?;

        Ok(schedule)
    }

    /// 通过 ID 获取排班
    pub async fn get_schedule_by_id_impl(&self, schedule_id: i64) -> Result<Option<Schedule>> {
        let result = Schedules::find_by_id(schedule_id)
            .one(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("查询排班失败: {e}")))?;

        result.map(|m| m.into_schedule()).transpose()
    }

    /// 获取数值 ID 最大的排班
    pub async fn get_latest_schedule_impl(&self) -> Result<Option<Schedule>> {
        let result = Schedules::find()
            .order_by_desc(Column::ScheduleId)
            .one(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("查询最新排班失败: {e}")))?;

        result.map(|m| m.into_schedule()).transpose()
    }

    /// 字段级合并更新
    ///
    /// 读出文档后经 catalog::apply_merge_update 只覆盖请求中出现
    /// 的字段，再整行写回；未提供的字段保持原值
    pub async fn merge_update_schedule_impl(
        &self,
        schedule_id: i64,
        update: UpdateScheduleRequest,
    ) -> Result<Option<Schedule>> {
        let Some(mut schedule) = self.get_schedule_by_id_impl(schedule_id).await? else {
            return Ok(None);
        };

        catalog::apply_merge_update(&mut schedule, update);

        to_active_model(&schedule)?
            .update(&self.db)
            .await
            .map_err(|e| SchedulerError::database_operation(format!("更新排班失败: {e}")))?;

        Ok(Some(schedule))
    }
}
