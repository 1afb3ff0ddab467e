use std::collections::HashMap;

use serde::Deserialize;
use ts_rs::TS;

use crate::models::schedules::entities::ScheduleState;
use crate::models::shifts::entities::{Shift, ShiftRole, StaffingCapacity};

// 初始化排班请求
//
// 时间格式 "HH:MM"；end_interval_time 为 "00:00" 时按日终处理。
// staffing_capacity 为历史数组格式 [lab_perm, num_tas]，对生成的
// 所有班次生效
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct InitScheduleRequest {
    pub start_interval_time: String,
    pub end_interval_time: String,
    pub shift_duration: u32,
    #[ts(type = "[number, number]")]
    pub staffing_capacity: StaffingCapacity,
}

// 排班合并更新请求
//
// 只覆盖请求中出现的字段（$set 语义），未出现的天数组与配置字段
// 保持原值，避免整文档替换造成丢失更新
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct UpdateScheduleRequest {
    pub state: Option<ScheduleState>,
    pub monday: Option<Vec<Shift>>,
    pub tuesday: Option<Vec<Shift>>,
    pub wednesday: Option<Vec<Shift>>,
    pub thursday: Option<Vec<Shift>>,
    pub friday: Option<Vec<Shift>>,
    pub saturday: Option<Vec<Shift>>,
    pub sunday: Option<Vec<Shift>>,
}

impl UpdateScheduleRequest {
    /// 用给定文档的七个天数组构造整周覆盖的更新（状态不动）
    pub fn replace_days(schedule: &crate::models::schedules::entities::Schedule) -> Self {
        Self {
            state: None,
            monday: Some(schedule.monday.clone()),
            tuesday: Some(schedule.tuesday.clone()),
            wednesday: Some(schedule.wednesday.clone()),
            thursday: Some(schedule.thursday.clone()),
            friday: Some(schedule.friday.clone()),
            saturday: Some(schedule.saturday.clone()),
            sunday: Some(schedule.sunday.clone()),
        }
    }

    /// 同上，但同时设置状态
    pub fn replace_days_with_state(
        schedule: &crate::models::schedules::entities::Schedule,
        state: ScheduleState,
    ) -> Self {
        Self {
            state: Some(state),
            ..Self::replace_days(schedule)
        }
    }
}

// 模板应用请求：时段键 ("<day-code>-<HH:MM>") 到角色需求的映射
//
// 未出现在映射中的班次标记为 is_empty 并清空占用
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct ApplyTemplateRequest {
    #[ts(type = "Record<string, string>")]
    pub slots: HashMap<String, ShiftRole>,
}
