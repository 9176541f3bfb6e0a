//! 用户资料 API
//!
//! 包含 /user-profiles 与 /user-profiles/:user_id 端点

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::domain::user::ProfileRequest;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, ApiPath, RequireUser};
use crate::state::AppState;

use super::response::{created, success};

/// 创建用户资料路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user-profiles", get(list_profiles).post(create_profile))
        .route(
            "/user-profiles/:user_id",
            get(get_profile).patch(update_profile).delete(delete_profile),
        )
}

/// 活跃用户的资料
///
/// GET /user-profiles
async fn list_profiles(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.list_active_profiles().await))
}

/// 为当前用户创建资料
///
/// POST /user-profiles
async fn create_profile(
    caller: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(user_id) = request.user_id {
        caller.ensure_self(user_id)?;
    }
    let fields = request.into_fields().map_err(ApiError::bad_request)?;
    let profile = state.db.create_profile(caller.user_id, fields).await?;

    info!(user_id = caller.user_id, "User profile created");
    Ok(created(profile))
}

/// GET /user-profiles/:user_id
async fn get_profile(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.get_profile(user_id).await?))
}

/// 部分更新
///
/// PATCH /user-profiles/:user_id
async fn update_profile(
    caller: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i32>,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.ensure_self(user_id)?;
    let fields = request.into_fields().map_err(ApiError::bad_request)?;
    let profile = state.db.update_profile(user_id, fields).await?;

    info!(user_id, "User profile updated");
    Ok(success(profile))
}

/// DELETE /user-profiles/:user_id
async fn delete_profile(
    caller: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    caller.ensure_self(user_id)?;
    let profile = state.db.delete_profile(user_id).await?;

    info!(user_id, "User profile deleted");
    Ok(success(profile))
}
