//! Team registry
//!
//! Teams own a capacity (`max_num`), a visibility status and, for encrypted
//! teams, a bcrypt-hashed join password. Memberships live in `pm_user_team`
//! with one row per (user, team): quitting flags the row, re-joining clears
//! the flag.
//!
//! Join runs inside a transaction and locks the team row before counting
//! members, so two concurrent joins cannot both take the last seat.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::{deserialize_lenient_i32, deserialize_lenient_opt_i32, deserialize_some};
use crate::config::TeamConfig;
use crate::entity::team::{self, TeamStatus};
use crate::entity::user::{self, UserResponse};
use crate::entity::{format_millis, now_millis, user_team};
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::CurrentUser;

const MAX_NAME_CHARS: usize = 256;

/// Create team request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "deserialize_lenient_i32")]
    pub max_num: i32,
    /// ISO-8601, null or empty for no expiry
    #[serde(default)]
    pub expire_time: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// 0=公开, 1=私有, 2=加密
    #[serde(default, deserialize_with = "deserialize_lenient_i32")]
    pub status: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequest {
    pub team_id: i64,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuitTeamRequest {
    pub team_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTeamRequest {
    pub id: i64,
}

/// Update team request; absent fields are left unchanged.
///
/// `expireTime: null` clears the expiry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub expire_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_lenient_opt_i32")]
    pub status: Option<i32>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Team list query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamQuery {
    #[serde(default)]
    pub search_text: Option<String>,
    /// Defaults to public
    #[serde(default)]
    pub status: Option<i32>,
}

/// Team as shown to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_lenient_i32")]
    pub max_num: i32,
    pub expire_time: Option<String>,
    pub user_id: i64,
    pub status: i32,
    pub create_time: String,
    pub create_user: Option<UserResponse>,
    /// Active member count
    pub has_join_num: u64,
    /// Whether the caller is an active member
    pub has_join: bool,
}

#[derive(Clone)]
pub struct TeamService {
    db: DatabaseConnection,
    limits: TeamConfig,
    bcrypt_cost: u32,
}

/// Parse an ISO-8601 expiry; naive timestamps are taken as UTC.
///
/// `None` or an empty string means "never expires". The result must lie
/// after `now`.
pub fn parse_expire_time(raw: Option<&str>, now: i64) -> AppResult<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|t| t.and_utc())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|t| t.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::default()).and_utc())
        })
        .map_err(|_| AppError::Validation("过期时间格式错误".to_string()))?;

    let millis = parsed.timestamp_millis();
    if millis <= now {
        return Err(AppError::Validation("过期时间不能早于当前时间".to_string()));
    }
    Ok(Some(millis))
}

fn parse_status(value: i32) -> AppResult<TeamStatus> {
    TeamStatus::try_from(value).map_err(|_| AppError::Validation("队伍状态不合法".to_string()))
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("队伍名称不能为空".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation("队伍名称过长".to_string()));
    }
    Ok(name.to_string())
}

/// Non-empty password, or the "encrypted team needs a password" error
fn require_team_password(password: Option<&str>) -> AppResult<&str> {
    password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("加密房间必须设置密码".to_string()))
}

/// Check a join password against an encrypted team
fn verify_join_password(team: &team::Model, password: Option<&str>) -> AppResult<()> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Err(AppError::Validation("请输入密码".to_string()));
    };
    let matches = team
        .password
        .as_deref()
        .map(|hash| bcrypt::verify(password, hash).unwrap_or(false))
        .unwrap_or(false);
    if !matches {
        return Err(AppError::Validation("密码错误".to_string()));
    }
    Ok(())
}

fn search_condition(search_text: Option<&str>) -> Option<Condition> {
    let text = search_text.map(str::trim).filter(|s| !s.is_empty())?;
    Some(
        Condition::any()
            .add(team::Column::Name.contains(text))
            .add(team::Column::Description.contains(text)),
    )
}

fn unexpired_condition(now: i64) -> Condition {
    Condition::any()
        .add(team::Column::ExpireTime.is_null())
        .add(team::Column::ExpireTime.gt(now))
}

async fn active_member_count<C: ConnectionTrait>(conn: &C, team_id: i64) -> AppResult<u64> {
    let count = user_team::Entity::find()
        .filter(user_team::Column::TeamId.eq(team_id))
        .filter(user_team::Column::IsDelete.eq(false))
        .count(conn)
        .await?;
    Ok(count)
}

async fn find_live_team<C: ConnectionTrait>(conn: &C, team_id: i64) -> AppResult<team::Model> {
    team::Entity::find_by_id(team_id)
        .filter(team::Column::IsDelete.eq(false))
        .one(conn)
        .await?
        .ok_or_not_found("队伍不存在")
}

impl TeamService {
    pub fn new(db: DatabaseConnection, limits: TeamConfig, bcrypt_cost: u32) -> Self {
        Self {
            db,
            limits,
            bcrypt_cost,
        }
    }

    fn check_max_num(&self, max_num: i32) -> AppResult<()> {
        let TeamConfig {
            min_members,
            max_members,
            ..
        } = self.limits;
        if !(min_members..=max_members).contains(&max_num) {
            return Err(AppError::Validation(format!(
                "队伍人数必须在{}-{}人之间",
                min_members, max_members
            )));
        }
        Ok(())
    }

    fn check_capacity(team: &team::Model, members: u64) -> AppResult<()> {
        if members >= team.max_num.max(0) as u64 {
            return Err(AppError::Capacity("队伍已满".to_string()));
        }
        Ok(())
    }

    async fn check_joined_limit<C: ConnectionTrait>(&self, conn: &C, user_id: i64) -> AppResult<()> {
        let joined = user_team::Entity::find()
            .filter(user_team::Column::UserId.eq(user_id))
            .filter(user_team::Column::IsDelete.eq(false))
            .count(conn)
            .await?;
        if joined >= self.limits.max_joined_teams {
            return Err(AppError::Capacity(format!(
                "最多加入{}个队伍",
                self.limits.max_joined_teams
            )));
        }
        Ok(())
    }

    /// Create a team owned by the caller, who becomes its first member
    pub async fn create(
        &self,
        caller: &CurrentUser,
        req: CreateTeamRequest,
    ) -> AppResult<TeamResponse> {
        let now = now_millis();
        let name = validate_name(&req.name)?;
        let status = parse_status(req.status)?;
        let expire_time = parse_expire_time(req.expire_time.as_deref(), now)?;
        self.check_max_num(req.max_num)?;

        let password = match status {
            TeamStatus::Encrypted => {
                let plain = require_team_password(req.password.as_deref())?;
                Some(bcrypt::hash(plain, self.bcrypt_cost)?)
            }
            _ => None,
        };

        let new_team = team::ActiveModel {
            name: Set(name),
            description: Set(req.description),
            max_num: Set(req.max_num),
            expire_time: Set(expire_time),
            user_id: Set(caller.id),
            status: Set(status.into()),
            password: Set(password),
            create_time: Set(now),
            update_time: Set(now),
            is_delete: Set(false),
            ..Default::default()
        };
        let owner_id = caller.id;

        let created = self
            .db
            .transaction::<_, team::Model, AppError>(|txn| {
                Box::pin(async move {
                    let created = new_team.insert(txn).await?;

                    let membership = user_team::ActiveModel {
                        user_id: Set(owner_id),
                        team_id: Set(created.id),
                        join_time: Set(now),
                        create_time: Set(now),
                        update_time: Set(now),
                        is_delete: Set(false),
                        ..Default::default()
                    };
                    membership.insert(txn).await?;

                    Ok(created)
                })
            })
            .await?;

        tracing::info!(
            "Team created: {} (id={}) by {}",
            created.name,
            created.id,
            caller.username
        );

        self.render_one(created, Some(caller.id)).await
    }

    /// Join a team, or come back to one left earlier
    pub async fn join(&self, caller: &CurrentUser, req: JoinTeamRequest) -> AppResult<()> {
        let txn = self.db.begin().await?;
        match self.join_within(&txn, caller, &req).await {
            Ok(()) => {
                txn.commit().await?;
                tracing::info!("User {} joined team {}", caller.username, req.team_id);
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(
                        "Failed to roll back join of team {}: {}",
                        req.team_id,
                        rollback_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn join_within(
        &self,
        txn: &DatabaseTransaction,
        caller: &CurrentUser,
        req: &JoinTeamRequest,
    ) -> AppResult<()> {
        let team = team::Entity::find_by_id(req.team_id)
            .filter(team::Column::IsDelete.eq(false))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_not_found("队伍不存在")?;

        let now = now_millis();
        if team.is_expired_at(now) {
            return Err(AppError::Validation("队伍已过期".to_string()));
        }

        let existing = user_team::Entity::find()
            .filter(user_team::Column::UserId.eq(caller.id))
            .filter(user_team::Column::TeamId.eq(team.id))
            .one(txn)
            .await?;
        let members = active_member_count(txn, team.id).await?;
        let password = req.password.as_deref();

        match existing {
            Some(row) if row.is_active() => {
                Err(AppError::Conflict("你已经是队伍成员了".to_string()))
            }
            Some(row) => {
                // Former member: no private-team rule, no joined-team cap
                Self::check_capacity(&team, members)?;
                if team.team_status() == TeamStatus::Encrypted {
                    verify_join_password(&team, password)?;
                }

                let mut active: user_team::ActiveModel = row.into();
                active.is_delete = Set(false);
                active.join_time = Set(now);
                active.update_time = Set(now);
                active.update(txn).await?;
                Ok(())
            }
            None => {
                Self::check_capacity(&team, members)?;
                self.check_joined_limit(txn, caller.id).await?;
                match team.team_status() {
                    TeamStatus::Private => {
                        return Err(AppError::Forbidden("禁止加入私有队伍".to_string()));
                    }
                    TeamStatus::Encrypted => verify_join_password(&team, password)?,
                    TeamStatus::Public => {}
                }

                let membership = user_team::ActiveModel {
                    user_id: Set(caller.id),
                    team_id: Set(team.id),
                    join_time: Set(now),
                    create_time: Set(now),
                    update_time: Set(now),
                    is_delete: Set(false),
                    ..Default::default()
                };
                membership.insert(txn).await?;
                Ok(())
            }
        }
    }

    /// Leave a team; owners cannot leave their own team
    pub async fn quit(&self, caller: &CurrentUser, req: QuitTeamRequest) -> AppResult<()> {
        let membership = user_team::Entity::find()
            .filter(user_team::Column::UserId.eq(caller.id))
            .filter(user_team::Column::TeamId.eq(req.team_id))
            .filter(user_team::Column::IsDelete.eq(false))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Conflict("未加入该队伍".to_string()))?;

        let team = team::Entity::find_by_id(req.team_id)
            .one(&self.db)
            .await?
            .ok_or_not_found("队伍不存在")?;

        if team.is_owned_by(caller.id) {
            return Err(AppError::Conflict("创建者不能退出队伍".to_string()));
        }

        let mut active: user_team::ActiveModel = membership.into();
        active.is_delete = Set(true);
        active.update_time = Set(now_millis());
        active.update(&self.db).await?;

        tracing::info!("User {} quit team {}", caller.username, req.team_id);
        Ok(())
    }

    /// Disband a team: soft-delete it and every membership row of it
    pub async fn disband(&self, caller: &CurrentUser, req: DeleteTeamRequest) -> AppResult<()> {
        let found = find_live_team(&self.db, req.id).await?;
        if !found.is_owned_by(caller.id) {
            return Err(AppError::Forbidden("无权限".to_string()));
        }

        let now = now_millis();
        let team_id = found.id;

        self.db
            .transaction::<_, (), AppError>(|txn| {
                Box::pin(async move {
                    let mut active: team::ActiveModel = found.into();
                    active.is_delete = Set(true);
                    active.update_time = Set(now);
                    active.update(txn).await?;

                    user_team::Entity::update_many()
                        .col_expr(user_team::Column::IsDelete, Expr::value(true))
                        .col_expr(user_team::Column::UpdateTime, Expr::value(now))
                        .filter(user_team::Column::TeamId.eq(team_id))
                        .exec(txn)
                        .await?;

                    Ok(())
                })
            })
            .await?;

        tracing::info!("Team {} disbanded by {}", team_id, caller.username);
        Ok(())
    }

    /// Owner-only edit of name, description, expiry, status and password
    pub async fn update(
        &self,
        caller: &CurrentUser,
        req: UpdateTeamRequest,
    ) -> AppResult<TeamResponse> {
        let found = find_live_team(&self.db, req.id).await?;
        if !found.is_owned_by(caller.id) {
            return Err(AppError::Forbidden("无权限".to_string()));
        }

        let now = now_millis();
        let status = match req.status {
            Some(value) => parse_status(value)?,
            None => found.team_status(),
        };
        let expire_time = match &req.expire_time {
            Some(raw) => Some(parse_expire_time(raw.as_deref(), now)?),
            None => None,
        };
        let password = match status {
            TeamStatus::Encrypted => {
                let plain = require_team_password(req.password.as_deref())?;
                Some(bcrypt::hash(plain, self.bcrypt_cost)?)
            }
            _ => None,
        };

        let mut active: team::ActiveModel = found.into();
        if let Some(name) = &req.name {
            active.name = Set(validate_name(name)?);
        }
        if let Some(description) = req.description {
            active.description = Set(description);
        }
        if let Some(expire_time) = expire_time {
            active.expire_time = Set(expire_time);
        }
        active.status = Set(status.into());
        active.password = Set(password);
        active.update_time = Set(now);
        let updated = active.update(&self.db).await?;

        tracing::info!("Team {} updated by {}", updated.id, caller.username);
        self.render_one(updated, Some(caller.id)).await
    }

    /// Owner-only view of one team
    pub async fn get(&self, caller: &CurrentUser, team_id: i64) -> AppResult<TeamResponse> {
        let found = find_live_team(&self.db, team_id).await?;
        if !found.is_owned_by(caller.id) {
            return Err(AppError::Forbidden("无权限".to_string()));
        }
        self.render_one(found, Some(caller.id)).await
    }

    /// Browse live, unexpired teams of one status
    pub async fn list(
        &self,
        caller: Option<&CurrentUser>,
        query: TeamQuery,
    ) -> AppResult<Vec<TeamResponse>> {
        let status = parse_status(query.status.unwrap_or(TeamStatus::Public.into()))?;

        let mut select = team::Entity::find()
            .filter(team::Column::IsDelete.eq(false))
            .filter(team::Column::Status.eq(i32::from(status)))
            .filter(unexpired_condition(now_millis()));
        if let Some(cond) = search_condition(query.search_text.as_deref()) {
            select = select.filter(cond);
        }

        let teams = select
            .order_by_desc(team::Column::CreateTime)
            .order_by_desc(team::Column::Id)
            .all(&self.db)
            .await?;

        self.render(teams, caller.map(|c| c.id)).await
    }

    /// Live, unexpired teams the caller is an active member of
    pub async fn list_joined(
        &self,
        caller: &CurrentUser,
        search_text: Option<&str>,
    ) -> AppResult<Vec<TeamResponse>> {
        let team_ids: Vec<i64> = user_team::Entity::find()
            .filter(user_team::Column::UserId.eq(caller.id))
            .filter(user_team::Column::IsDelete.eq(false))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.team_id)
            .collect();

        if team_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = team::Entity::find()
            .filter(team::Column::Id.is_in(team_ids))
            .filter(team::Column::IsDelete.eq(false))
            .filter(unexpired_condition(now_millis()));
        if let Some(cond) = search_condition(search_text) {
            select = select.filter(cond);
        }

        let teams = select
            .order_by_desc(team::Column::CreateTime)
            .order_by_desc(team::Column::Id)
            .all(&self.db)
            .await?;

        self.render(teams, Some(caller.id)).await
    }

    /// Live teams owned by the caller, expired ones included
    pub async fn list_created(
        &self,
        caller: &CurrentUser,
        search_text: Option<&str>,
    ) -> AppResult<Vec<TeamResponse>> {
        let mut select = team::Entity::find()
            .filter(team::Column::UserId.eq(caller.id))
            .filter(team::Column::IsDelete.eq(false));
        if let Some(cond) = search_condition(search_text) {
            select = select.filter(cond);
        }

        let teams = select
            .order_by_desc(team::Column::CreateTime)
            .order_by_desc(team::Column::Id)
            .all(&self.db)
            .await?;

        self.render(teams, Some(caller.id)).await
    }

    async fn render_one(&self, found: team::Model, caller_id: Option<i64>) -> AppResult<TeamResponse> {
        self.render(vec![found], caller_id)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("rendered team list is empty".to_string()))
    }

    /// Attach owner profile, live member count and the caller's membership
    async fn render(
        &self,
        teams: Vec<team::Model>,
        caller_id: Option<i64>,
    ) -> AppResult<Vec<TeamResponse>> {
        if teams.is_empty() {
            return Ok(Vec::new());
        }

        let team_ids: Vec<i64> = teams.iter().map(|t| t.id).collect();
        let memberships = user_team::Entity::find()
            .filter(user_team::Column::TeamId.is_in(team_ids))
            .filter(user_team::Column::IsDelete.eq(false))
            .all(&self.db)
            .await?;

        let mut counts: HashMap<i64, u64> = HashMap::new();
        let mut joined: HashSet<i64> = HashSet::new();
        for m in &memberships {
            *counts.entry(m.team_id).or_default() += 1;
            if Some(m.user_id) == caller_id {
                joined.insert(m.team_id);
            }
        }

        let owner_ids: Vec<i64> = teams
            .iter()
            .map(|t| t.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owners: HashMap<i64, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(owner_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(teams
            .into_iter()
            .map(|t| TeamResponse {
                has_join_num: counts.get(&t.id).copied().unwrap_or(0),
                has_join: joined.contains(&t.id),
                create_user: owners.get(&t.user_id).cloned().map(UserResponse::from),
                expire_time: t.expire_time.map(format_millis),
                create_time: format_millis(t.create_time),
                id: t.id,
                name: t.name,
                description: t.description,
                max_num: t.max_num,
                user_id: t.user_id,
                status: t.status,
            })
            .collect())
    }
}
