use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// TA 实验室权限等级（线上格式为整数 lab_perm）
//
// 等级之间存在次序关系：权限不低于班次 min_role 的 TA 才可被分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoleLevel {
    OhOnly = 0,       // 仅 Office Hours
    LabAssistant = 1, // 实验课助教
    LabLead = 2,      // 实验课负责人
}

impl RoleLevel {
    pub fn as_int(self) -> u8 {
        self as u8
    }

    pub fn from_int(value: i64) -> Result<Self, String> {
        match value {
            0 => Ok(RoleLevel::OhOnly),
            1 => Ok(RoleLevel::LabAssistant),
            2 => Ok(RoleLevel::LabLead),
            _ => Err(format!("无效的 lab_perm: '{value}'. 支持的等级: 0, 1, 2")),
        }
    }
}

impl Serialize for RoleLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.as_int())
    }
}

impl<'de> Deserialize<'de> for RoleLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        RoleLevel::from_int(value).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for RoleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_int())
    }
}

// TA 对单个时段的偏好等级（线上格式为整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreferenceLevel {
    Unavailable = 0, // 不可用
    Available = 1,   // 可用
    Preferred = 2,   // 偏好
}

impl PreferenceLevel {
    pub fn as_int(self) -> u8 {
        self as u8
    }

    pub fn from_int(value: i64) -> Result<Self, String> {
        match value {
            0 => Ok(PreferenceLevel::Unavailable),
            1 => Ok(PreferenceLevel::Available),
            2 => Ok(PreferenceLevel::Preferred),
            _ => Err(format!("无效的偏好等级: '{value}'. 支持的等级: 0, 1, 2")),
        }
    }
}

impl Serialize for PreferenceLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.as_int())
    }
}

impl<'de> Deserialize<'de> for PreferenceLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        PreferenceLevel::from_int(value).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for PreferenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_int())
    }
}

// 单条时段偏好
//
// time_slots 为 "day:HH:MM-HH:MM" 形式；shift_id 在排班网格生成前
// 为空字符串，解析绑定后填入具体班次 ID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/ta.ts")]
pub struct PreferenceEntry {
    pub shift_id: String,
    pub time_slots: String,
    #[ts(type = "number")]
    pub preference: PreferenceLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/ta.ts")]
pub struct Ta {
    // 校内登录名 (如 "mgarci01")
    pub ta_id: String,
    pub first_name: String,
    pub last_name: String,
    // 是否为 Teaching Fellow
    pub is_tf: bool,
    #[ts(type = "number")]
    pub lab_perm: RoleLevel,
    pub preferences: Vec<PreferenceEntry>,
    #[ts(type = "Array<string>")]
    pub confirmed_shifts: BTreeSet<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
