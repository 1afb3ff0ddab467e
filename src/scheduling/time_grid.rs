//! 时段网格
//!
//! 把配置的工作区间 (起止时刻 + 班次时长) 换算为每个工作日的
//! 有序离散时段序列。"00:00" 作为区间终点一律在这里规范化为
//! 日终 (24:00)，任何调用方不得自行重复这条规则。

use crate::errors::{Result, SchedulerError};
use crate::models::schedules::entities::Schedule;
use crate::models::shifts::entities::Weekday;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// 一天内的时刻，自午夜起的分钟数 (0..=1440)
///
/// 1440 表示日终，渲染为 "24:00"，仅作为时段终点出现
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes <= MINUTES_PER_DAY {
            Some(TimeOfDay(minutes))
        } else {
            None
        }
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// 严格解析 "HH:MM" (0<=HH<24, 0<=MM<60)，用于配置区间端点
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let (hh, mm) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid time format: {s}"))?;
        if mm.len() != 2 || hh.is_empty() || hh.len() > 2 {
            return Err(format!("Invalid time format: {s}"));
        }
        let hours: u16 = hh
            .parse()
            .map_err(|_| format!("Invalid time format: {s}"))?;
        let minutes: u16 = mm
            .parse()
            .map_err(|_| format!("Invalid time format: {s}"))?;
        if hours >= 24 || minutes >= 60 {
            return Err(format!("Time out of range: {s}"));
        }
        Ok(TimeOfDay(hours * 60 + minutes))
    }

    /// 时段端点解析：在严格格式之外额外接受 "24:00" (日终)
    pub fn parse_slot_time(s: &str) -> std::result::Result<Self, String> {
        if s == "24:00" {
            return Ok(TimeOfDay::END_OF_DAY);
        }
        TimeOfDay::parse(s)
    }

    pub fn checked_add(self, minutes: u16) -> Option<Self> {
        TimeOfDay::from_minutes(self.0.checked_add(minutes)?)
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// 区间终点规范化：午夜按日终处理
///
/// 不做这条规范化时，"09:00-00:00" 这类配置会因 end <= start
/// 静默产生 0 个班次
pub fn normalized_end(end: TimeOfDay) -> TimeOfDay {
    if end == TimeOfDay::MIDNIGHT {
        TimeOfDay::END_OF_DAY
    } else {
        end
    }
}

/// 配置的每日工作区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// 单个班次时长（分钟），必须为正
    pub slot_duration: u16,
}

impl WorkInterval {
    /// 解析并规范化配置区间
    ///
    /// 时长为 0 或时刻串非法时返回 InvalidInterval；终点额外接受
    /// "24:00"（持久化后的规范形），并与 "00:00" 一样按日终处理；
    /// end <= start 不是错误，只是产生 0 个班次
    pub fn parse(start: &str, end: &str, slot_duration: u32) -> Result<Self> {
        let start = TimeOfDay::parse(start).map_err(SchedulerError::invalid_interval)?;
        let end = TimeOfDay::parse_slot_time(end).map_err(SchedulerError::invalid_interval)?;
        let slot_duration = u16::try_from(slot_duration)
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| {
                SchedulerError::invalid_interval(format!(
                    "Shift duration must be a positive number of minutes, got {slot_duration}"
                ))
            })?;

        Ok(WorkInterval {
            start,
            end: normalized_end(end),
            slot_duration,
        })
    }

    /// 从已持久化的排班文档恢复区间配置
    pub fn from_schedule(schedule: &Schedule) -> Result<Self> {
        WorkInterval::parse(
            &schedule.start_interval_time,
            &schedule.end_interval_time,
            schedule.shift_duration,
        )
    }

    /// 每个工作日的班次数：floor((end - start) / duration)
    pub fn count_slots(&self) -> usize {
        if self.end <= self.start {
            return 0;
        }
        ((self.end.minutes() - self.start.minutes()) / self.slot_duration) as usize
    }

    /// 枚举当日全部时段，第 i 个时段为
    /// [start + i*duration, start + (i+1)*duration)
    pub fn enumerate_slots(&self) -> Vec<(TimeOfDay, TimeOfDay)> {
        let mut slots = Vec::with_capacity(self.count_slots());
        let mut cursor = self.start;
        for _ in 0..self.count_slots() {
            // count_slots 已保证终点不会越过日终
            let next = cursor
                .checked_add(self.slot_duration)
                .expect("slot end within day bounds");
            slots.push((cursor, next));
            cursor = next;
        }
        slots
    }
}

/// 时段的规范标识："<day-code>-<HH:MM>"
///
/// 模板映射、偏好绑定、班次查找都以此为键
pub fn slot_key(weekday: Weekday, start: TimeOfDay) -> String {
    format!("{}-{}", weekday.code(), start)
}
