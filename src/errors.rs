//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_scheduler_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum SchedulerError {
            $($variant(String),)*
        }

        impl SchedulerError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(SchedulerError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(SchedulerError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(SchedulerError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl SchedulerError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        SchedulerError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_scheduler_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Serialization("E008", "Serialization Error"),
    StoragePluginNotFound("E009", "Storage Plugin Not Found"),
    DateParse("E010", "Date Parse Error"),
    InvalidInterval("E011", "Invalid Work Interval"),
    MalformedPreference("E012", "Malformed Preference"),
    UnalignedSlot("E013", "Unaligned Time Slot"),
    CapacityExceeded("E014", "Shift Capacity Exceeded"),
    RoleIneligible("E015", "Role Ineligible"),
    DispatchFailure("E016", "Algorithm Dispatch Failure"),
    ContractViolation("E017", "Assignment Contract Violation"),
    IllegalTransition("E018", "Illegal Schedule State Transition"),
}

impl SchedulerError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SchedulerError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for SchedulerError {
    fn from(err: sea_orm::DbErr) -> Self {
        SchedulerError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for SchedulerError {
    fn from(err: chrono::ParseError) -> Self {
        SchedulerError::DateParse(err.to_string())
    }
}

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::DispatchFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchedulerError::cache_connection("test").code(), "E001");
        assert_eq!(SchedulerError::invalid_interval("test").code(), "E011");
        assert_eq!(SchedulerError::malformed_preference("test").code(), "E012");
        assert_eq!(SchedulerError::contract_violation("test").code(), "E017");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            SchedulerError::capacity_exceeded("test").error_type(),
            "Shift Capacity Exceeded"
        );
        assert_eq!(
            SchedulerError::role_ineligible("test").error_type(),
            "Role Ineligible"
        );
        assert_eq!(
            SchedulerError::dispatch_failure("test").error_type(),
            "Algorithm Dispatch Failure"
        );
    }

    #[test]
    fn test_error_message() {
        let err = SchedulerError::malformed_preference("Invalid day: xx");
        assert_eq!(err.message(), "Invalid day: xx");
    }

    #[test]
    fn test_format_simple() {
        let err = SchedulerError::invalid_interval("slot duration must be positive");
        let formatted = err.format_simple();
        assert!(formatted.contains("Invalid Work Interval"));
        assert!(formatted.contains("slot duration must be positive"));
    }
}
