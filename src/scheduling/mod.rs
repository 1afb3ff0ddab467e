//! 排班核心逻辑
//!
//! - `time_grid`: 工作区间到离散时段网格的纯函数换算
//! - `preference`: TA 偏好字符串编解码与网格校验
//! - `catalog`: 班次目录生成、模板应用与占用约束
//! - `contract`: 与外部分配算法交换的请求/结果及其校验
//! - `lifecycle`: 排班文档状态机

pub mod catalog;
pub mod contract;
pub mod lifecycle;
pub mod preference;
pub mod time_grid;
