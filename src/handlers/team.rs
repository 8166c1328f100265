//! Team handlers
//!
//! Implements team CRUD and membership operations

use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::error::AppResult;
use crate::extract::{Json, Query};
use crate::middleware::auth::CurrentUser;
use crate::routes::ApiResponse;
use crate::services::team::{
    CreateTeamRequest, DeleteTeamRequest, JoinTeamRequest, QuitTeamRequest, TeamQuery,
    TeamResponse, UpdateTeamRequest,
};
use crate::state::AppState;

/// Search box on the "my teams" pages
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "searchText", default)]
    pub search_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

/// POST /api/team/add
pub async fn add_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTeamRequest>,
) -> AppResult<Json<ApiResponse<TeamResponse>>> {
    let team = state.teams.create(&user, req).await?;
    Ok(Json(ApiResponse::success(team, "创建成功")))
}

/// GET /api/team/list - anonymous callers allowed
pub async fn list_teams(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Query(query): Query<TeamQuery>,
) -> AppResult<Json<ApiResponse<Vec<TeamResponse>>>> {
    let caller = user.as_ref().map(|Extension(u)| u);
    let teams = state.teams.list(caller, query).await?;
    Ok(Json(ApiResponse::success(teams, "获取成功")))
}

/// POST /api/team/join
pub async fn join_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<JoinTeamRequest>,
) -> AppResult<Json<ApiResponse<bool>>> {
    state.teams.join(&user, req).await?;
    Ok(Json(ApiResponse::success(true, "加入成功")))
}

/// GET /api/team/list/my/join
pub async fn list_my_joined(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<TeamResponse>>>> {
    let teams = state
        .teams
        .list_joined(&user, query.search_text.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(teams, "获取成功")))
}

/// GET /api/team/list/my/create
pub async fn list_my_created(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<TeamResponse>>>> {
    let teams = state
        .teams
        .list_created(&user, query.search_text.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(teams, "获取成功")))
}

/// POST /api/team/quit
pub async fn quit_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<QuitTeamRequest>,
) -> AppResult<Json<ApiResponse<bool>>> {
    state.teams.quit(&user, req).await?;
    Ok(Json(ApiResponse::success(true, "退出成功")))
}

/// POST /api/team/delete
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<DeleteTeamRequest>,
) -> AppResult<Json<ApiResponse<bool>>> {
    state.teams.disband(&user, req).await?;
    Ok(Json(ApiResponse::success(true, "解散成功")))
}

/// GET /api/team/get
pub async fn get_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<IdQuery>,
) -> AppResult<Json<ApiResponse<TeamResponse>>> {
    let team = state.teams.get(&user, query.id).await?;
    Ok(Json(ApiResponse::success(team, "获取成功")))
}

/// POST /api/team/update
pub async fn update_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateTeamRequest>,
) -> AppResult<Json<ApiResponse<TeamResponse>>> {
    let team = state.teams.update(&user, req).await?;
    Ok(Json(ApiResponse::success(team, "更新成功")))
}
