use serde::Deserialize;
use ts_rs::TS;

use crate::models::tas::entities::RoleLevel;

// 创建 TA 请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/ta.ts")]
pub struct CreateTaRequest {
    pub ta_id: String,
    pub first_name: String,
    pub last_name: String,
    pub is_tf: bool,
    #[ts(type = "number")]
    pub lab_perm: RoleLevel,
}

// 提交偏好请求
//
// 每个元素为编码串 "<day-code>:<HH:MM>-<HH:MM>:<level>"；
// 整批校验通过后整体替换该 TA 的偏好向量（重试幂等），
// 任一条目非法则整批拒绝
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/ta.ts")]
pub struct SubmitPreferencesRequest {
    pub preferences: Vec<String>,
}
