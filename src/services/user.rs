//! User directory
//!
//! Registration, login verification, profile updates and the three ways of
//! finding other users: recommend (newest first), match (shared tags) and
//! tag search.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::Deserialize;

use super::Page;
use crate::entity::user::{self, Gender, UserResponse};
use crate::entity::now_millis;
use crate::error::{AppError, AppResult, OptionExt};
use crate::matching;
use crate::middleware::CurrentUser;

/// Default avatar for new accounts
pub const DEFAULT_AVATAR_URL: &str =
    "https://gips3.baidu.com/it/u=1004796864,1363400944&fm=3039&app=3039&f=JPEG?w=1024&h=1024";

/// Upper bound for `/user/match?num=`
pub const MAX_MATCH_NUM: u64 = 100;

/// Register request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_account: String,
    pub user_password: String,
    pub check_password: String,
    /// Nickname
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub planet_code: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: i64,
    /// Nickname
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub gender: Option<i32>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct UserService {
    db: DatabaseConnection,
    bcrypt_cost: u32,
}

fn parse_gender(value: i32) -> AppResult<i32> {
    match value {
        0 | 1 => Ok(value),
        _ => Err(AppError::Validation("性别不合法".to_string())),
    }
}

/// Insert a new account; losing a race on the unique account column reads as a taken account
async fn insert_account<C: ConnectionTrait>(
    conn: &C,
    new_user: user::ActiveModel,
) -> AppResult<user::Model> {
    new_user.insert(conn).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("账号已存在".to_string())
        }
        _ => AppError::Database(e),
    })
}

impl UserService {
    pub fn new(db: DatabaseConnection, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    /// Create an account; returns the new user id
    pub async fn register(&self, req: RegisterRequest) -> AppResult<i64> {
        let account = req.user_account.trim().to_string();
        if account.is_empty() || req.user_password.is_empty() {
            return Err(AppError::Validation("用户名或密码不能为空".to_string()));
        }
        if req.user_password != req.check_password {
            return Err(AppError::Validation("两次输入的密码不一致".to_string()));
        }
        let gender = parse_gender(req.gender.unwrap_or(Gender::Male.into()))?;

        if self.account_exists(&account).await? {
            return Err(AppError::Conflict("账号已存在".to_string()));
        }

        let hashed = bcrypt::hash(&req.user_password, self.bcrypt_cost)?;
        let tags = matching::normalize_tags(req.tags.unwrap_or_default());
        let now = now_millis();

        let new_user = user::ActiveModel {
            username: Set(account.clone()),
            password: Set(hashed),
            nickname: Set(req.username.unwrap_or_default()),
            avatar_url: Set(DEFAULT_AVATAR_URL.to_string()),
            gender: Set(gender),
            phone: Set(req.phone.unwrap_or_default()),
            email: Set(req.email.unwrap_or_default()),
            planet_code: Set(req.planet_code.unwrap_or_default()),
            tags: Set(Some(user::encode_tags(&tags))),
            profile: Set(None),
            user_status: Set(0),
            is_active: Set(true),
            create_time: Set(now),
            update_time: Set(now),
            ..Default::default()
        };
        let created = insert_account(&self.db, new_user).await?;

        tracing::info!("User registered: {} (id={})", account, created.id);
        Ok(created.id)
    }

    pub async fn account_exists(&self, account: &str) -> AppResult<bool> {
        let count = user::Entity::find()
            .filter(user::Column::Username.eq(account.trim()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Check credentials; the caller stores the returned id in the session
    pub async fn login(&self, account: &str, password: &str) -> AppResult<user::Model> {
        if account.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("账号或密码不能为空".to_string()));
        }

        let found = user::Entity::find()
            .filter(user::Column::Username.eq(account.trim()))
            .one(&self.db)
            .await?;

        let Some(found) = found else {
            tracing::warn!("Login failed: user not found - {}", account);
            return Err(AppError::Validation("用户不存在".to_string()));
        };

        if !bcrypt::verify(password, &found.password).unwrap_or(false) {
            tracing::warn!("Login failed: wrong password - {}", account);
            return Err(AppError::Validation("密码错误".to_string()));
        }

        if !found.is_active {
            tracing::warn!("Login failed: user disabled - {}", account);
            return Err(AppError::Forbidden("账号已被禁用".to_string()));
        }

        Ok(found)
    }

    /// Fresh profile of the caller
    pub async fn current(&self, caller: &CurrentUser) -> AppResult<UserResponse> {
        let found = user::Entity::find_by_id(caller.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("用户不存在")?;
        Ok(found.into())
    }

    /// Update the caller's own profile
    pub async fn update(&self, caller: &CurrentUser, req: UpdateUserRequest) -> AppResult<()> {
        let found = user::Entity::find_by_id(req.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("用户不存在")?;

        if found.id != caller.id {
            return Err(AppError::Unauthorized("无权限修改他人信息".to_string()));
        }

        let mut active: user::ActiveModel = found.into();
        let mut updated = false;

        if let Some(nickname) = req.username {
            active.nickname = Set(nickname);
            updated = true;
        }
        if let Some(gender) = req.gender {
            active.gender = Set(parse_gender(gender)?);
            updated = true;
        }
        if let Some(phone) = req.phone {
            active.phone = Set(phone);
            updated = true;
        }
        if let Some(email) = req.email {
            active.email = Set(email);
            updated = true;
        }
        if let Some(profile) = req.profile {
            active.profile = Set(Some(profile));
            updated = true;
        }
        if let Some(avatar_url) = req.avatar_url {
            active.avatar_url = Set(avatar_url);
            updated = true;
        }
        if let Some(tags) = req.tags {
            let tags = matching::normalize_tags(tags);
            active.tags = Set(Some(user::encode_tags(&tags)));
            updated = true;
        }

        if !updated {
            return Err(AppError::Validation("未更新任何字段".to_string()));
        }

        active.update_time = Set(now_millis());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Active users other than the caller, newest first
    pub async fn recommend(
        &self,
        caller: &CurrentUser,
        page_num: u64,
        page_size: u64,
    ) -> AppResult<Page<UserResponse>> {
        if page_num == 0 || page_size == 0 {
            return Err(AppError::Validation("分页参数不合法".to_string()));
        }

        let paginator = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::Id.ne(caller.id))
            .order_by_desc(user::Column::CreateTime)
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, page_size);

        let totals = paginator.num_items_and_pages().await?;
        let records = paginator.fetch_page(page_num - 1).await?;

        Ok(Page {
            records: records.into_iter().map(UserResponse::from).collect(),
            total: totals.number_of_items,
            pages: totals.number_of_pages,
            current: page_num,
        })
    }

    /// Up to `num` users sharing at least one tag with the caller.
    ///
    /// A caller without tags gets `num` random active users instead.
    pub async fn match_users(&self, caller: &CurrentUser, num: u64) -> AppResult<Vec<UserResponse>> {
        if num == 0 || num > MAX_MATCH_NUM {
            return Err(AppError::Validation("匹配数量不合法".to_string()));
        }

        let me = user::Entity::find_by_id(caller.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("用户不存在")?;
        let my_tags = me.tag_list();

        let others = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::Id.ne(caller.id));

        let picked = if my_tags.is_empty() {
            others
                .order_by(Expr::cust("RANDOM()"), Order::Asc)
                .limit(num)
                .all(&self.db)
                .await?
        } else {
            let candidates = others
                .order_by_desc(user::Column::CreateTime)
                .order_by_desc(user::Column::Id)
                .all(&self.db)
                .await?;
            matching::select_matches(&my_tags, candidates, num as usize)
        };

        tracing::debug!("Matched {} users for {}", picked.len(), caller.username);
        Ok(picked.into_iter().map(UserResponse::from).collect())
    }

    /// Active users accepted by every token; see [`matching::matches_all_tokens`]
    pub async fn search_by_tags(&self, tokens: Vec<String>) -> AppResult<Vec<UserResponse>> {
        let tokens = matching::normalize_tags(tokens);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let users = user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .order_by_desc(user::Column::CreateTime)
            .order_by_desc(user::Column::Id)
            .all(&self.db)
            .await?;

        Ok(users
            .into_iter()
            .filter(|u| matching::matches_all_tokens(&tokens, u))
            .map(UserResponse::from)
            .collect())
    }
}
