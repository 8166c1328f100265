//! UserTeam entity - 用户队伍关系表
//!
//! 表名: pm_user_team
//!
//! 每个 (user_id, team_id) 只有一行; 退出队伍只置 is_delete, 重新加入时复用该行。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pm_user_team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 用户ID
    pub user_id: i64,

    /// 队伍ID
    pub team_id: i64,

    /// 加入时间 (Unix 毫秒), 重新加入时刷新
    pub join_time: i64,

    pub create_time: i64,

    pub update_time: i64,

    /// 是否已退出
    pub is_delete: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_active(&self) -> bool {
        !self.is_delete
    }
}
