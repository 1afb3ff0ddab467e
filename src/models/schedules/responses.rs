use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::schedules::entities::{Schedule, ScheduleState};
use crate::models::tas::entities::Ta;

// 最新排班 ID 查询响应
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct LatestScheduleResponse {
    pub schedule_id: i64,
}

// 算法输入快照：全部 TA（偏好已绑定班次 ID）与当前活动排班
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct AlgorithmInputResponse {
    pub tas: Vec<Ta>,
    pub schedule: Schedule,
}

// 算法调度结果响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/schedule.ts")]
pub struct DispatchResponse {
    pub schedule_id: i64,
    pub state: ScheduleState,
    // 分配写回的班次数
    pub assigned_shifts: usize,
    // 算法进程输出尾部（诊断用）
    pub output: String,
}
