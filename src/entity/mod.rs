//! Entity module - SeaORM 实体定义
//!
//! 包含所有数据库表对应的实体模型

pub mod team;
pub mod user;
pub mod user_team;

use chrono::{TimeZone, Utc};

/// 当前时间 (Unix 毫秒)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// 将 Unix 毫秒格式化为 `%Y-%m-%dT%H:%M:%S` (UTC)
pub fn format_millis(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}
