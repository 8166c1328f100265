use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::error::CODE_SUCCESS;
use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;

pub mod health;

/// Uniform response envelope: `{code, date, message}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub date: Option<T>,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            code: CODE_SUCCESS,
            date: Some(data),
            message: message.into(),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            date: None,
            message: message.into(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: CODE_SUCCESS,
            date: None,
            message: message.into(),
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.session.secure)
        .with_http_only(true);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        // User directory
        .route("/user/register", post(handlers::auth::register))
        .route("/user/account/exist", post(handlers::auth::account_exist))
        .route("/user/login", post(handlers::auth::login))
        .route("/user/logout", post(handlers::auth::logout))
        .route("/user/current", get(handlers::auth::current_user))
        .route("/user/recommend", get(handlers::user::recommend))
        .route("/user/match", get(handlers::user::match_users))
        .route("/user/update", post(handlers::user::update_user))
        .route("/user/search/tags", get(handlers::user::search_by_tags))
        // Team registry
        .route("/team/add", post(handlers::team::add_team))
        .route("/team/list", get(handlers::team::list_teams))
        .route("/team/join", post(handlers::team::join_team))
        .route("/team/list/my/join", get(handlers::team::list_my_joined))
        .route("/team/list/my/create", get(handlers::team::list_my_created))
        .route("/team/quit", post(handlers::team::quit_team))
        .route("/team/delete", post(handlers::team::delete_team))
        .route("/team/get", get(handlers::team::get_team))
        .route("/team/update", post(handlers::team::update_team));

    Router::new()
        .nest("/api", api_routes)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
pub async fn fallback() -> (axum::http::StatusCode, axum::Json<ApiResponse<()>>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(ApiResponse::error(404, "Not Found")),
    )
}
