//! User entity - 用户表
//!
//! 表名: pm_user

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::format_millis;

/// 性别
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// 男
    Male = 0,
    /// 女
    Female = 1,
}

impl From<i32> for Gender {
    fn from(value: i32) -> Self {
        match value {
            1 => Gender::Female,
            _ => Gender::Male,
        }
    }
}

impl From<Gender> for i32 {
    fn from(gender: Gender) -> Self {
        gender as i32
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pm_user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 登录账号 (唯一)
    #[sea_orm(column_type = "String(Some(256))", unique)]
    pub username: String,

    /// 密码 (bcrypt 哈希)
    #[sea_orm(column_type = "String(Some(128))")]
    #[serde(skip_serializing)]
    pub password: String,

    /// 昵称
    #[sea_orm(column_type = "String(Some(256))")]
    pub nickname: String,

    /// 头像
    #[sea_orm(column_type = "String(Some(1024))")]
    pub avatar_url: String,

    /// 性别: 0=男, 1=女
    pub gender: i32,

    #[sea_orm(column_type = "String(Some(128))")]
    pub phone: String,

    #[sea_orm(column_type = "String(Some(256))")]
    pub email: String,

    /// 星球编号
    #[sea_orm(column_type = "String(Some(512))")]
    pub planet_code: String,

    /// 标签 (JSON 字符串数组)
    #[sea_orm(column_type = "Text", nullable)]
    pub tags: Option<String>,

    /// 个人简介
    #[sea_orm(column_type = "Text", nullable)]
    pub profile: Option<String>,

    /// 用户状态
    pub user_status: i32,

    /// 是否可用
    pub is_active: bool,

    /// 创建时间 (Unix 毫秒)
    pub create_time: i64,

    /// 更新时间 (Unix 毫秒)
    pub update_time: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 解析标签; 非法 JSON 视为无标签
    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(self.tags.as_deref())
    }

    pub fn gender(&self) -> Gender {
        Gender::from(self.gender)
    }
}

/// Decode the JSON tag column
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
        .unwrap_or_default()
}

/// Encode tags for the JSON tag column
pub fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// 用户响应 (不含密码)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    /// 昵称, 未设置时为账号
    pub username: String,
    pub user_account: String,
    pub avatar_url: String,
    pub gender: i32,
    pub phone: String,
    pub email: String,
    pub planet_code: String,
    pub tags: Vec<String>,
    pub profile: Option<String>,
    pub user_status: i32,
    pub create_time: String,
}

impl From<Model> for UserResponse {
    fn from(model: Model) -> Self {
        let tags = model.tag_list();
        let username = if model.nickname.is_empty() {
            model.username.clone()
        } else {
            model.nickname
        };
        Self {
            id: model.id,
            username,
            user_account: model.username,
            avatar_url: model.avatar_url,
            gender: model.gender,
            phone: model.phone,
            email: model.email,
            planet_code: model.planet_code,
            tags,
            profile: model.profile,
            user_status: model.user_status,
            create_time: format_millis(model.create_time),
        }
    }
}
