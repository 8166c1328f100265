//! Authentication middleware
//!
//! Resolves the session into a [`CurrentUser`] and rejects anonymous calls
//! to protected API routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::EntityTrait;
use tower_sessions::Session;

use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;

/// Session key for storing the user id
pub const SESSION_USER_KEY: &str = "user_id";

/// The authenticated caller, passed explicitly into every service operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    /// Login account
    pub username: String,
    pub nickname: String,
}

impl From<&user::Model> for CurrentUser {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            nickname: model.nickname.clone(),
        }
    }
}

/// Paths that don't require authentication
///
/// `/api/team/list` is listed here as well: anonymous callers may browse
/// teams, they just never show up as members.
fn is_public_path(path: &str) -> bool {
    if !path.starts_with("/api") {
        return true;
    }

    matches!(
        path,
        "/api/health"
            | "/api/user/login"
            | "/api/user/logout"
            | "/api/user/register"
            | "/api/user/account/exist"
            | "/api/user/search/tags"
            | "/api/team/list"
    )
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let user_id: Option<i64> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    if let Some(user_id) = user_id {
        match user::Entity::find_by_id(user_id).one(&state.db).await {
            Ok(Some(model)) if model.is_active => {
                request.extensions_mut().insert(CurrentUser::from(&model));
            }
            Ok(_) => {
                tracing::warn!("Session refers to missing or inactive user: {}", user_id);
            }
            Err(e) => {
                return AppError::Database(e).into_response();
            }
        }
    }

    if !is_public_path(&path) && request.extensions().get::<CurrentUser>().is_none() {
        return AppError::not_login().into_response();
    }

    next.run(request).await
}
