use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::shifts::entities::{Shift, ShiftId, Weekday};

// 排班文档生命周期状态
//
// 状态机本身（合法迁移、失败回退）见 scheduling::lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub enum ScheduleState {
    Drafted,    // 已选定工作区间，尚未生成班次
    Populated,  // 班次已生成，模板/偏好收集中
    Dispatched, // 已发送给外部分配算法
    Published,  // 分配结果已校验并写回
}

impl ScheduleState {
    pub const DRAFTED: &'static str = "drafted";
    pub const POPULATED: &'static str = "populated";
    pub const DISPATCHED: &'static str = "dispatched";
    pub const PUBLISHED: &'static str = "published";
}

impl<'de> Deserialize<'de> for ScheduleState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            ScheduleState::DRAFTED => Ok(ScheduleState::Drafted),
            ScheduleState::POPULATED => Ok(ScheduleState::Populated),
            ScheduleState::DISPATCHED => Ok(ScheduleState::Dispatched),
            ScheduleState::PUBLISHED => Ok(ScheduleState::Published),
            _ => Err(serde::de::Error::custom(format!(
                "无效的排班状态: '{s}'. 支持的状态: drafted, populated, dispatched, published"
            ))),
        }
    }
}

impl std::fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleState::Drafted => write!(f, "{}", ScheduleState::DRAFTED),
            ScheduleState::Populated => write!(f, "{}", ScheduleState::POPULATED),
            ScheduleState::Dispatched => write!(f, "{}", ScheduleState::DISPATCHED),
            ScheduleState::Published => write!(f, "{}", ScheduleState::PUBLISHED),
        }
    }
}

impl std::str::FromStr for ScheduleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drafted" => Ok(ScheduleState::Drafted),
            "populated" => Ok(ScheduleState::Populated),
            "dispatched" => Ok(ScheduleState::Dispatched),
            "published" => Ok(ScheduleState::Published),
            _ => Err(format!("Invalid schedule state: {s}")),
        }
    }
}

// 周排班文档：配置区间 + 按天分组的班次数组
//
// 系统同一时刻只保留一份活动排班，替换是整体性的
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct Schedule {
    pub schedule_id: i64,
    // "HH:MM"
    pub start_interval_time: String,
    // "HH:MM"，"00:00" 按日终 (24:00) 处理
    pub end_interval_time: String,
    // 单个班次时长（分钟）
    pub shift_duration: u32,
    pub state: ScheduleState,
    pub monday: Vec<Shift>,
    pub tuesday: Vec<Shift>,
    pub wednesday: Vec<Shift>,
    pub thursday: Vec<Shift>,
    pub friday: Vec<Shift>,
    pub saturday: Vec<Shift>,
    pub sunday: Vec<Shift>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Schedule {
    pub fn day(&self, weekday: Weekday) -> &Vec<Shift> {
        match weekday {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut Vec<Shift> {
        match weekday {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        }
    }

    // 按固定周内次序遍历全部班次
    pub fn all_shifts(&self) -> impl Iterator<Item = &Shift> {
        Weekday::ALL.into_iter().flat_map(|day| self.day(day).iter())
    }

    pub fn find_shift(&self, shift_id: &ShiftId) -> Option<&Shift> {
        self.day(shift_id.weekday)
            .iter()
            .find(|shift| shift.shift_id == *shift_id)
    }

    pub fn find_shift_mut(&mut self, shift_id: &ShiftId) -> Option<&mut Shift> {
        self.day_mut(shift_id.weekday)
            .iter_mut()
            .find(|shift| shift.shift_id == *shift_id)
    }

    pub fn total_shifts(&self) -> usize {
        Weekday::ALL
            .into_iter()
            .map(|day| self.day(day).len())
            .sum()
    }
}
