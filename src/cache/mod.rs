//! 对象缓存层
//!
//! 插件式缓存后端（Moka 内存 / Redis），通过 ctor 在启动前注册。
//! 业务侧用它缓存活动排班文档与最新排班 ID；任何排班变更都要
//! 使对应键失效。

pub mod object_cache;
pub mod register;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// 缓存查询结果
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    // 后端暂时不可用等情况：键状态未知，按未命中处理
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// 反序列化读取；缓存里的坏数据直接剔除
pub async fn get_object<T: DeserializeOwned>(cache: &dyn ObjectCache, key: &str) -> Option<T> {
    match cache.get_raw(key).await {
        CacheResult::Found(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Evicting undecodable cache entry '{}': {}", key, e);
                cache.remove(key).await;
                None
            }
        },
        _ => None,
    }
}

/// 序列化写入；序列化失败只记日志，缓存永远不挡主流程
pub async fn insert_object<T: Serialize>(cache: &dyn ObjectCache, key: &str, value: &T, ttl: u64) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.insert_raw(key.to_string(), raw, ttl).await,
        Err(e) => warn!("Failed to serialize cache entry '{}': {}", key, e),
    }
}

/// 最新排班 ID 的缓存键
pub const LATEST_SCHEDULE_ID_KEY: &str = "schedule:latest_id";

/// 排班文档的缓存键
pub fn schedule_cache_key(schedule_id: i64) -> String {
    format!("schedule:{schedule_id}")
}

/// 声明一个缓存后端插件
///
/// 在模块加载时（main 之前）把构造函数挂进注册表
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $plugin:ty) => {
        #[ctor::ctor]
        fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$plugin>::new()
                            .map_err($crate::errors::SchedulerError::cache_connection)?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                    })
                        as $crate::cache::register::BoxedObjectCacheFuture
                }),
            );
        }
    };
}
