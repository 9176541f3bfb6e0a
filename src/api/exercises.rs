//! 训练动作 API
//!
//! 包含 /exercises、/exercises/:id 与 /exercises/:id/muscles 端点

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::domain::exercise::{CreateExerciseRequest, ExerciseQuery, LinkMuscleRequest};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, RequireUser};
use crate::state::AppState;

use super::response::{created, success};

/// 创建动作路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exercises", get(get_exercises).post(create_exercise))
        .route("/exercises/:id", get(get_exercise).delete(delete_exercise))
        .route(
            "/exercises/:id/muscles",
            get(list_exercise_muscles).post(link_exercise_muscle),
        )
}

/// 全部动作，或 `?name=` 单个动作
///
/// GET /exercises
async fn get_exercises(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ExerciseQuery>,
) -> ApiResult<Response> {
    match query.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Ok(success(state.db.get_exercise_by_name(name).await?).into_response()),
        None => Ok(success(state.db.list_exercises().await).into_response()),
    }
}

/// POST /exercises
async fn create_exercise(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateExerciseRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = request.exercise_name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("exercise_name is required"));
    }
    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let exercise = state.db.create_exercise(name, description).await?;
    info!(exercise_id = exercise.exercise_id, name = %exercise.exercise_name, "Exercise created");
    Ok(created(exercise))
}

/// GET /exercises/:id
async fn get_exercise(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.get_exercise(id).await?))
}

/// 删除动作（级联删除训练组与肌肉关联）
///
/// DELETE /exercises/:id
async fn delete_exercise(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let exercise = state.db.delete_exercise(id).await?;
    info!(exercise_id = id, "Exercise deleted");
    Ok(success(exercise))
}

/// 动作锻炼的肌肉
///
/// GET /exercises/:id/muscles
async fn list_exercise_muscles(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.muscles_for_exercise(id).await?))
}

/// POST /exercises/:id/muscles
async fn link_exercise_muscle(
    _user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<LinkMuscleRequest>,
) -> ApiResult<impl IntoResponse> {
    let link = state
        .db
        .link_muscle(id, request.muscle_id, request.involvement_level)
        .await?;
    info!(
        exercise_id = id,
        muscle_id = request.muscle_id,
        level = request.involvement_level.as_str(),
        "Muscle linked to exercise"
    );
    Ok(created(link))
}
