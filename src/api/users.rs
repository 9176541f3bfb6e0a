//! 用户 API
//!
//! 包含 /users 与 /users/:id 端点

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::domain::user::{
    is_valid_email, is_valid_password, is_valid_username, normalize_email, CreateUserRequest,
    UpdateUserRequest, MIN_PASSWORD_LEN,
};
use crate::domain::{NewUser, UserChanges, UserView};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, ApiPath, RequireUser};
use crate::services::password::hash_password;
use crate::state::AppState;

use super::response::{created, success};

/// 创建用户路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

fn check_email(email: &str) -> ApiResult<String> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(email)
}

fn check_username(username: &str) -> ApiResult<String> {
    let username = username.trim();
    if !is_valid_username(username) {
        return Err(ApiError::bad_request(
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ));
    }
    Ok(username.to_string())
}

fn check_password(password: &str) -> ApiResult<()> {
    if !is_valid_password(password) {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

async fn hash(state: &AppState, password: String) -> ApiResult<String> {
    hash_password(password, state.config.bcrypt_cost)
        .await
        .map_err(|e| ApiError::internal(format!("{:#}", e)))
}

/// 列出用户
///
/// GET /users
async fn list_users(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let users: Vec<UserView> = state
        .db
        .list_users()
        .await
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(success(users))
}

/// 注册
///
/// POST /users
async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.email.trim().is_empty()
        || request.password.is_empty()
        || request.username.trim().is_empty()
    {
        return Err(ApiError::bad_request(
            "Email, password and username are required",
        ));
    }

    let email = check_email(&request.email)?;
    let username = check_username(&request.username)?;
    check_password(&request.password)?;

    let password_hash = hash(&state, request.password).await?;
    let user = state
        .db
        .create_user(NewUser {
            email,
            username,
            password_hash,
        })
        .await?;

    info!(user_id = user.user_id, "User registered");
    Ok(created(UserView::from(user)))
}

/// 获取用户
///
/// GET /users/:id
async fn get_user(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let user = state.db.get_user(id).await?;
    Ok(success(UserView::from(user)))
}

/// 更新自己的账号
///
/// PATCH /users/:id
async fn update_user(
    caller: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.ensure_self(id)?;

    let email = request.email.as_deref().map(check_email).transpose()?;
    let username = request.username.as_deref().map(check_username).transpose()?;
    let password_hash = match request.password {
        Some(password) => {
            check_password(&password)?;
            Some(hash(&state, password).await?)
        }
        None => None,
    };

    if email.is_none() && username.is_none() && password_hash.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let user = state
        .db
        .update_user(
            id,
            UserChanges {
                email,
                username,
                password_hash,
            },
        )
        .await?;

    info!(user_id = id, "User updated");
    Ok(success(UserView::from(user)))
}

/// 删除自己的账号（级联删除资料与训练）
///
/// DELETE /users/:id
async fn delete_user(
    caller: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    caller.ensure_self(id)?;
    let user = state.db.delete_user(id).await?;

    info!(user_id = id, "User deleted");
    Ok(success(UserView::from(user)))
}
