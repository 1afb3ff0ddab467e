use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::tas::entities::RoleLevel;

// 工作日
//
// 线上缩写码 (m/tu/w/th/f/sa/su) 用于班次 ID 与偏好字符串，
// 全名 (monday..sunday) 用于排班文档的按天分组键
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    // 固定的周内次序，周偏好向量与文档键都按此排列
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "m",
            Weekday::Tuesday => "tu",
            Weekday::Wednesday => "w",
            Weekday::Thursday => "th",
            Weekday::Friday => "f",
            Weekday::Saturday => "sa",
            Weekday::Sunday => "su",
        }
    }

    pub fn document_key(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    // 缩写码解析，大小写不敏感
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "m" => Some(Weekday::Monday),
            "tu" => Some(Weekday::Tuesday),
            "w" => Some(Weekday::Wednesday),
            "th" => Some(Weekday::Thursday),
            "f" => Some(Weekday::Friday),
            "sa" => Some(Weekday::Saturday),
            "su" => Some(Weekday::Sunday),
            _ => None,
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::from_code(s).ok_or_else(|| format!("Invalid weekday code: {s}"))
    }
}

// 班次角色需求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftRole {
    OfficeHours, // 答疑
    Lab,         // 实验课
}

impl ShiftRole {
    pub const OFFICE_HOURS: &'static str = "office_hours";
    pub const LAB: &'static str = "lab";
}

impl Serialize for ShiftRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ShiftRole::OfficeHours => serializer.serialize_str(ShiftRole::OFFICE_HOURS),
            ShiftRole::Lab => serializer.serialize_str(ShiftRole::LAB),
        }
    }
}

impl<'de> Deserialize<'de> for ShiftRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            ShiftRole::OFFICE_HOURS => Ok(ShiftRole::OfficeHours),
            ShiftRole::LAB => Ok(ShiftRole::Lab),
            _ => Err(serde::de::Error::custom(format!(
                "无效的班次角色: '{s}'. 支持的角色: office_hours, lab"
            ))),
        }
    }
}

impl std::fmt::Display for ShiftRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftRole::OfficeHours => write!(f, "{}", ShiftRole::OFFICE_HOURS),
            ShiftRole::Lab => write!(f, "{}", ShiftRole::LAB),
        }
    }
}

// 结构化班次 ID：工作日 + 当日第几个班次（从 1 开始）
//
// 线上仍渲染为历史字符串格式 "<code><ordinal>" (如 "m1"、"tu3")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShiftId {
    pub weekday: Weekday,
    pub ordinal: u32,
}

impl ShiftId {
    pub fn new(weekday: Weekday, ordinal: u32) -> Self {
        Self { weekday, ordinal }
    }
}

impl std::fmt::Display for ShiftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.weekday.code(), self.ordinal)
    }
}

impl std::str::FromStr for ShiftId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s.find(|c: char| c.is_ascii_digit());
        let Some(split) = split else {
            return Err(format!("Invalid shift id: {s}"));
        };
        let (code, ordinal) = s.split_at(split);
        let weekday =
            Weekday::from_code(code).ok_or_else(|| format!("Invalid shift id: {s}"))?;
        let ordinal: u32 = ordinal
            .parse()
            .map_err(|_| format!("Invalid shift id: {s}"))?;
        if ordinal == 0 {
            return Err(format!("Invalid shift id: {s}"));
        }
        Ok(ShiftId { weekday, ordinal })
    }
}

impl Serialize for ShiftId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ShiftId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// 班次人员容量：最低角色等级 + 人数
//
// 线上格式为历史双元素数组 [lab_perm, num_tas]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffingCapacity {
    pub min_role: RoleLevel,
    pub count: u32,
}

impl StaffingCapacity {
    pub fn new(min_role: RoleLevel, count: u32) -> Self {
        Self { min_role, count }
    }
}

impl Serialize for StaffingCapacity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.min_role.as_int())?;
        tuple.serialize_element(&self.count)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for StaffingCapacity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let [min_role, count] = <[i64; 2]>::deserialize(deserializer)?;
        let min_role = RoleLevel::from_int(min_role).map_err(serde::de::Error::custom)?;
        if count < 1 {
            return Err(serde::de::Error::custom(format!(
                "无效的班次人数: '{count}'. 人数必须为正整数"
            )));
        }
        Ok(StaffingCapacity {
            min_role,
            count: count as u32,
        })
    }
}

// 一个可被分配的班次
//
// is_empty 为 true 表示该时段未配置任何角色需求（既非 OH 也非 Lab），
// 不参与分配；tas_scheduled 使用有序集合保证成员唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/shift.ts")]
pub struct Shift {
    #[ts(type = "string")]
    pub shift_id: ShiftId,
    pub schedule_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub is_lab: bool,
    pub is_empty: bool,
    #[ts(type = "Array<string>")]
    pub tas_scheduled: BTreeSet<String>,
    #[ts(type = "[number, number]")]
    pub staffing_capacity: StaffingCapacity,
}

impl Shift {
    // 角色需求；未配置时返回 None
    pub fn role(&self) -> Option<ShiftRole> {
        if self.is_empty {
            None
        } else if self.is_lab {
            Some(ShiftRole::Lab)
        } else {
            Some(ShiftRole::OfficeHours)
        }
    }

    pub fn occupant_count(&self) -> usize {
        self.tas_scheduled.len()
    }

    pub fn is_full(&self) -> bool {
        self.tas_scheduled.len() >= self.staffing_capacity.count as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_codes() {
        assert_eq!(Weekday::Monday.code(), "m");
        assert_eq!(Weekday::Thursday.code(), "th");
        assert_eq!(Weekday::from_code("TU"), Some(Weekday::Tuesday));
        assert_eq!(Weekday::from_code("x"), None);
        assert_eq!(Weekday::ALL.len(), 7);
    }

    #[test]
    fn test_shift_id_rendering() {
        let id = ShiftId::new(Weekday::Monday, 1);
        assert_eq!(id.to_string(), "m1");
        let id = ShiftId::new(Weekday::Tuesday, 10);
        assert_eq!(id.to_string(), "tu10");
    }

    #[test]
    fn test_shift_id_parse() {
        let id: ShiftId = "th3".parse().unwrap();
        assert_eq!(id.weekday, Weekday::Thursday);
        assert_eq!(id.ordinal, 3);
        assert!("3".parse::<ShiftId>().is_err());
        assert!("xx1".parse::<ShiftId>().is_err());
        assert!("m0".parse::<ShiftId>().is_err());
        assert!("m".parse::<ShiftId>().is_err());
    }

    #[test]
    fn test_staffing_capacity_wire_format() {
        let cap = StaffingCapacity::new(RoleLevel::LabAssistant, 3);
        let json = serde_json::to_string(&cap).unwrap();
        assert_eq!(json, "[1,3]");

        let back: StaffingCapacity = serde_json::from_str("[2,4]").unwrap();
        assert_eq!(back.min_role, RoleLevel::LabLead);
        assert_eq!(back.count, 4);

        assert!(serde_json::from_str::<StaffingCapacity>("[0,0]").is_err());
        assert!(serde_json::from_str::<StaffingCapacity>("[5,1]").is_err());
    }

    #[test]
    fn test_shift_role_wire_format() {
        let json = serde_json::to_string(&ShiftRole::Lab).unwrap();
        assert_eq!(json, "\"lab\"");
        let back: ShiftRole = serde_json::from_str("\"office_hours\"").unwrap();
        assert_eq!(back, ShiftRole::OfficeHours);
        assert!(serde_json::from_str::<ShiftRole>("\"seminar\"").is_err());
    }
}
