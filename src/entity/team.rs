//! Team entity - 队伍表
//!
//! 表名: pm_team

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 队伍状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamStatus {
    /// 公开, 任何人可加入
    Public = 0,
    /// 私有, 禁止新成员加入
    Private = 1,
    /// 加密, 需要密码加入
    Encrypted = 2,
}

impl TryFrom<i32> for TeamStatus {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TeamStatus::Public),
            1 => Ok(TeamStatus::Private),
            2 => Ok(TeamStatus::Encrypted),
            other => Err(other),
        }
    }
}

impl From<TeamStatus> for i32 {
    fn from(status: TeamStatus) -> Self {
        status as i32
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pm_team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 队伍名
    #[sea_orm(column_type = "String(Some(256))")]
    pub name: String,

    /// 队伍描述
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// 最大人数
    pub max_num: i32,

    /// 过期时间 (Unix 毫秒), 为空表示永不过期
    pub expire_time: Option<i64>,

    /// 创建人 (队长)
    pub user_id: i64,

    /// 队伍状态: 0=公开, 1=私有, 2=加密
    pub status: i32,

    /// 加入密码 (bcrypt 哈希), 仅加密队伍有值
    #[sea_orm(column_type = "String(Some(128))", nullable)]
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// 创建时间 (Unix 毫秒)
    pub create_time: i64,

    /// 更新时间 (Unix 毫秒)
    pub update_time: i64,

    /// 是否删除 (解散)
    pub is_delete: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// 成员关系通过手动查询 user_team 表处理

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 未知状态按私有处理, 避免放开加入
    pub fn team_status(&self) -> TeamStatus {
        TeamStatus::try_from(self.status).unwrap_or(TeamStatus::Private)
    }

    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expire_time.is_some_and(|t| t < now_millis)
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}
