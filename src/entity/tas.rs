//! TA 实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tas")]
pub struct Model {
    // 校内登录名作为主键
    #[sea_orm(primary_key, auto_increment = false)]
    pub ta_id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_tf: bool,
    pub lab_perm: i32,
    // JSON 文档列
    pub preferences: Json,
    pub confirmed_shifts: Json,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_ta(self) -> crate::errors::Result<crate::models::tas::entities::Ta> {
        use crate::errors::SchedulerError;
        use crate::models::tas::entities::{RoleLevel, Ta};
        use chrono::{DateTime, Utc};

        Ok(Ta {
            ta_id: self.ta_id,
            first_name: self.first_name,
            last_name: self.last_name,
            is_tf: self.is_tf,
            lab_perm: RoleLevel::from_int(self.lab_perm as i64)
                .map_err(SchedulerError::database_operation)?,
            preferences: serde_json::from_value(self.preferences)?,
            confirmed_shifts: serde_json::from_value(self.confirmed_shifts)?,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
