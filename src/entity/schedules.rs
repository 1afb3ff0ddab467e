//! 排班实体
//!
//! 每个工作日一个 JSON 列，合并更新时只 Set 请求中出现的列

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub schedule_id: i64,
    pub start_interval_time: String,
    pub end_interval_time: String,
    pub shift_duration: i32,
    pub state: String,
    pub monday: Json,
    pub tuesday: Json,
    pub wednesday: Json,
    pub thursday: Json,
    pub friday: Json,
    pub saturday: Json,
    pub sunday: Json,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_schedule(self) -> crate::errors::Result<crate::models::schedules::entities::Schedule> {
        use crate::errors::SchedulerError;
        use crate::models::schedules::entities::Schedule;
        use chrono::{DateTime, Utc};

        Ok(Schedule {
            schedule_id: self.schedule_id,
            start_interval_time: self.start_interval_time,
            end_interval_time: self.end_interval_time,
            shift_duration: self.shift_duration as u32,
            state: self
                .state
                .parse()
                .map_err(SchedulerError::database_operation)?,
            monday: serde_json::from_value(self.monday)?,
            tuesday: serde_json::from_value(self.tuesday)?,
            wednesday: serde_json::from_value(self.wednesday)?,
            thursday: serde_json::from_value(self.thursday)?,
            friday: serde_json::from_value(self.friday)?,
            saturday: serde_json::from_value(self.saturday)?,
            sunday: serde_json::from_value(self.sunday)?,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
