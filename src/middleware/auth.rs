//! Bearer 令牌认证
//!
//! 提供 `RequireUser` extractor，受保护的 handler 通过它拿到当前用户 ID

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, header::HeaderMap, request::Parts},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::{Claims, TokenError};
use crate::state::AppState;

/// 已认证用户 Extractor
///
/// 校验 `Authorization: Bearer <access token>`
///
/// # Example
///
/// ```ignore
/// async fn list_workouts(
///     user: RequireUser,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<impl IntoResponse> {
///     let workouts = state.db.workouts_for_user(user.user_id).await;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub user_id: i32,
    pub claims: Claims,
}

impl RequireUser {
    /// 只允许操作自己的资源
    pub fn ensure_self(&self, user_id: i32) -> Result<(), ApiError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            tracing::warn!(
                caller = self.user_id,
                target = user_id,
                "Attempt to modify another user's resource"
            );
            Err(ApiError::forbidden("You can only modify your own account"))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.jwt.validate_access(token).await?;

        // 账号被删除或停用后，未过期的令牌也不再有效
        match state.db.get_user(claims.user_id).await {
            Ok(user) if user.active => {}
            _ => {
                tracing::debug!(
                    user_id = claims.user_id,
                    "Token belongs to a missing or disabled user"
                );
                return Err(TokenError::Invalid.into());
            }
        }

        Ok(RequireUser {
            user_id: claims.user_id,
            claims,
        })
    }
}

/// 提取 Bearer 令牌
///
/// scheme 不区分大小写，格式必须是 `<scheme> <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("invalid authorization format"))?;

    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer")
                && !token.is_empty()
                && !token.contains(' ') =>
        {
            Ok(token)
        }
        _ => {
            tracing::debug!("Malformed Authorization header");
            Err(ApiError::unauthorized("invalid authorization format"))
        }
    }
}
