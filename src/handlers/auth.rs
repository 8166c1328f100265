//! Authentication handlers
//!
//! Implements register, login, logout and current user endpoints

use axum::{extract::State, Extension};
use serde::Deserialize;
use tower_sessions::Session;

use crate::entity::user::UserResponse;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::{CurrentUser, SESSION_USER_KEY};
use crate::routes::ApiResponse;
use crate::services::user::RegisterRequest;
use crate::state::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_account: String,
    pub user_password: String,
}

/// Account name lookup
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountExistRequest {
    pub user_account: String,
}

/// POST /api/user/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<i64>>> {
    let id = state.users.register(req).await?;
    Ok(Json(ApiResponse::success(id, "注册成功")))
}

/// POST /api/user/account/exist
pub async fn account_exist(
    State(state): State<AppState>,
    Json(req): Json<AccountExistRequest>,
) -> AppResult<Json<ApiResponse<bool>>> {
    let exists = state.users.account_exists(&req.user_account).await?;
    let message = if exists { "用户名已存在" } else { "用户名可用" };
    Ok(Json(ApiResponse::success(exists, message)))
}

/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let found = state.users.login(&req.user_account, &req.user_password).await?;

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("failed to renew session: {}", e)))?;
    session
        .insert(SESSION_USER_KEY, found.id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to save session: {}", e)))?;

    tracing::info!("User logged in: {}", found.username);
    Ok(Json(ApiResponse::success(found.into(), "登录成功")))
}

/// POST /api/user/logout
pub async fn logout(session: Session) -> AppResult<Json<ApiResponse<()>>> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("failed to flush session: {}", e)))?;
    Ok(Json(ApiResponse::success_msg("退出成功")))
}

/// GET /api/user/current
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let profile = state.users.current(&user).await?;
    Ok(Json(ApiResponse::success(profile, "获取成功")))
}
