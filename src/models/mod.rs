pub mod common;
pub mod schedules;
pub mod shifts;
pub mod system;
pub mod tas;

pub use common::response::ApiResponse;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 业务错误码（HTTP 响应 envelope 中的 code 字段）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 10xx
    InvalidParams = 1001,
    NotFound = 1002,
    InternalServerError = 1003,

    // 排班配置错误 20xx
    InvalidInterval = 2001,
    ScheduleNotFound = 2002,
    IllegalTransition = 2003,

    // TA / 偏好错误 21xx
    TaNotFound = 2101,
    TaAlreadyExists = 2102,
    MalformedPreference = 2103,
    UnalignedSlot = 2104,

    // 分配约束错误 22xx
    CapacityExceeded = 2201,
    RoleIneligible = 2202,

    // 算法调度错误 23xx
    DispatchFailure = 2301,
    ContractViolation = 2302,
}

// 记录程序启动时间（用于系统状态接口）
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
