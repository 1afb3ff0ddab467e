use serde::Serialize;
use ts_rs::TS;

use crate::models::tas::entities::Ta;

// TA 名册响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/ta.ts")]
pub struct TaListResponse {
    pub items: Vec<Ta>,
    pub total: i64,
}
