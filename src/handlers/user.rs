//! User handlers
//!
//! Profile update, recommendation, matching and tag search

use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::entity::user::UserResponse;
use crate::error::AppResult;
use crate::extract::{Json, MultiQuery, Query};
use crate::middleware::auth::CurrentUser;
use crate::routes::ApiResponse;
use crate::services::user::UpdateUserRequest;
use crate::services::Page;
use crate::state::AppState;

/// Query parameters for recommendation paging
#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(rename = "pageNum", default = "default_page_num")]
    pub page_num: u64,
    #[serde(rename = "pageSize", default = "default_page_size")]
    pub page_size: u64,
}

fn default_page_num() -> u64 {
    1
}

fn default_page_size() -> u64 {
    8
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    #[serde(default = "default_match_num")]
    pub num: u64,
}

fn default_match_num() -> u64 {
    10
}

/// `?tagNameList=a&tagNameList=b`; jQuery-style `tagNameList[]` also accepted
#[derive(Debug, Deserialize)]
pub struct TagSearchQuery {
    #[serde(rename = "tagNameList", alias = "tagNameList[]", default)]
    pub tag_name_list: Vec<String>,
}

/// GET /api/user/recommend
pub async fn recommend(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<ApiResponse<Page<UserResponse>>>> {
    let page = state
        .users
        .recommend(&user, query.page_num, query.page_size)
        .await?;
    Ok(Json(ApiResponse::success(page, "获取成功")))
}

/// GET /api/user/match
pub async fn match_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<MatchQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = state.users.match_users(&user, query.num).await?;
    Ok(Json(ApiResponse::success(users, "获取成功")))
}

/// POST /api/user/update
pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<i32>>> {
    state.users.update(&user, req).await?;
    Ok(Json(ApiResponse::success(1, "更新成功")))
}

/// GET /api/user/search/tags
pub async fn search_by_tags(
    State(state): State<AppState>,
    MultiQuery(query): MultiQuery<TagSearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    if query.tag_name_list.is_empty() {
        return Ok(Json(ApiResponse::success(Vec::new(), "标签参数为空")));
    }
    let users = state.users.search_by_tags(query.tag_name_list).await?;
    Ok(Json(ApiResponse::success(users, "搜索成功")))
}
