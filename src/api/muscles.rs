//! 肌肉 API
//!
//! GET/POST/DELETE /muscles

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::domain::exercise::{CreateMuscleRequest, MuscleQuery};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, ApiQuery, RequireUser};
use crate::state::AppState;

use super::response::{created, success};

/// 创建肌肉路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/muscles",
        get(get_muscles).post(create_muscle).delete(delete_muscle),
    )
}

/// `?name=` 返回单个肌肉，否则返回列表（可按 `?group=` 过滤）
///
/// GET /muscles
async fn get_muscles(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<MuscleQuery>,
) -> ApiResult<axum::response::Response> {
    match query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            let muscle = state.db.get_muscle_by_name(name).await?;
            Ok(success(muscle).into_response())
        }
        None => {
            let group = query.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
            Ok(success(state.db.list_muscles(group).await).into_response())
        }
    }
}

/// POST /muscles
async fn create_muscle(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateMuscleRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = request.muscle_name.trim();
    let group = request.muscle_group.trim();
    if name.is_empty() || group.is_empty() {
        return Err(ApiError::bad_request(
            "muscle_name and muscle_group are required",
        ));
    }

    let muscle = state.db.create_muscle(name, group).await?;
    info!(muscle_id = muscle.muscle_id, name = %muscle.muscle_name, "Muscle created");
    Ok(created(muscle))
}

/// DELETE /muscles?name=
async fn delete_muscle(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<MuscleQuery>,
) -> ApiResult<impl IntoResponse> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("Muscle name is required"))?;

    let muscle = state.db.delete_muscle_by_name(name).await?;
    info!(muscle_id = muscle.muscle_id, name = %muscle.muscle_name, "Muscle deleted");
    Ok(success(muscle))
}
