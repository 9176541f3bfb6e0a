//! 认证 API
//!
//! 包含 /login, /refresh, /logout 端点

use axum::{extract::State, response::IntoResponse, routing::post, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::user::normalize_email;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ApiJson;
use crate::services::{password::verify_password, Claims};
use crate::state::{store::StoreError, AppState};

use super::response::success;

/// refresh token 最短长度，更短的直接视为格式错误
const MIN_REFRESH_TOKEN_LEN: usize = 10;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// 创建认证路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// 邮箱密码登录，返回令牌对
///
/// POST /login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let user = match state.db.get_user_by_email(&normalize_email(&request.email)).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => return Err(ApiError::unauthorized("Invalid credentials")),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(request.password, user.password_hash.clone()).await {
        warn!(user_id = user.user_id, "Failed login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    if !user.active {
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    let tokens = state.jwt.generate_pair(user.user_id)?;

    if let Err(e) = state.db.update_last_login(user.user_id).await {
        warn!(user_id = user.user_id, error = %e, "Failed to update last login");
    }

    info!(user_id = user.user_id, "User logged in");
    Ok(success(tokens))
}

/// 使用 refresh token 换取新的令牌对，旧 refresh token 作废
///
/// POST /refresh
async fn refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = checked_refresh_claims(&state, &request.refresh_token).await?;

    match state.db.get_user(claims.user_id).await {
        Ok(user) if user.active => {}
        _ => return Err(ApiError::unauthorized("Invalid refresh token")),
    }

    // 并发刷新同一个令牌时只有一个请求能成功
    if !state.jwt.invalidate(&claims).await {
        return Err(ApiError::unauthorized("Invalid refresh token"));
    }
    let tokens = state.jwt.generate_pair(claims.user_id)?;
    Ok(success(tokens))
}

/// 注销 refresh token
///
/// POST /logout
async fn logout(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = checked_refresh_claims(&state, &request.refresh_token).await?;
    state.jwt.invalidate(&claims).await;

    info!(user_id = claims.user_id, "User logged out");
    Ok(success(MessageResponse {
        message: "Logged out successfully",
    }))
}

async fn checked_refresh_claims(state: &AppState, token: &str) -> ApiResult<Claims> {
    if token.len() < MIN_REFRESH_TOKEN_LEN {
        return Err(ApiError::bad_request("Invalid refresh token format"));
    }
    state
        .jwt
        .validate_refresh(token)
        .await
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))
}
