//! 训练 API
//!
//! 包含 /workouts、/workouts/date、/workouts/:id 及其训练组子路由

use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{delete, get, patch},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::user::parse_date;
use crate::domain::workout::{
    client_calendar_date, parse_timezone, CreateWorkoutRequest, DateQuery,
    UpdateWorkoutRequest, UpdateWorkoutSetRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, RequireUser};
use crate::state::AppState;

use super::response::{created, success};

/// 客户端 IANA 时区
pub const TIMEZONE_HEADER: &str = "x-user-timezone";

#[derive(Debug, Serialize)]
struct DeletedWorkout {
    message: &'static str,
    id: i32,
}

#[derive(Debug, Serialize)]
struct DeletedExerciseSets {
    workout_id: i32,
    exercise_id: i32,
    deleted: usize,
}

/// 创建训练路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route("/workouts/date", get(get_workout_by_date))
        .route(
            "/workouts/:id",
            get(get_workout).patch(rename_workout).delete(delete_workout),
        )
        .route("/workouts/:id/sets", get(list_workout_sets))
        .route(
            "/workouts/:id/exercises/:exercise_id",
            delete(delete_exercise_sets),
        )
        .route(
            "/workouts/:id/exercises/:exercise_id/sets/:set_number",
            patch(update_set).delete(delete_set),
        )
}

/// 当前用户的全部训练，日期倒序
///
/// GET /workouts
async fn list_workouts(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.workouts_for_user(user.user_id).await))
}

/// 创建训练
///
/// POST /workouts
///
/// `clientworkoutdate` 按 `X-User-Timezone` 换算为用户本地日期
async fn create_workout(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateWorkoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let tz_header = headers
        .get(TIMEZONE_HEADER)
        .map(|v| {
            v.to_str()
                .map_err(|_| ApiError::bad_request("invalid timezone: header is not valid text"))
        })
        .transpose()?;
    let tz = parse_timezone(tz_header).map_err(ApiError::bad_request)?;
    let workout_date =
        client_calendar_date(&request.client_workout_date, tz).map_err(ApiError::bad_request)?;

    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let workout = state
        .db
        .create_workout(user.user_id, workout_date, title)
        .await?;

    info!(
        user_id = user.user_id,
        workout_id = workout.workout_id,
        date = %workout.workout_date,
        timezone = %tz,
        "Workout created"
    );
    Ok(created(workout))
}

/// GET /workouts/date?date=YYYY-MM-DD
async fn get_workout_by_date(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_date(&query.date)
        .ok_or_else(|| ApiError::bad_request("Invalid date format; use YYYY-MM-DD"))?;
    Ok(success(
        state.db.workout_by_user_and_date(user.user_id, date).await?,
    ))
}

/// GET /workouts/:id
async fn get_workout(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.get_workout_for_user(id, user.user_id).await?))
}

/// 重命名
///
/// PATCH /workouts/:id
async fn rename_workout(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateWorkoutRequest>,
) -> ApiResult<impl IntoResponse> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("workouttitle is required"));
    }

    let workout = state
        .db
        .rename_workout(id, user.user_id, Some(title.to_string()))
        .await?;
    Ok(success(workout))
}

/// 删除训练及其训练组
///
/// DELETE /workouts/:id
async fn delete_workout(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let id = state.db.delete_workout(id, user.user_id).await?;

    info!(user_id = user.user_id, workout_id = id, "Workout deleted");
    Ok(success(DeletedWorkout {
        message: "Workout deleted successfully",
        id,
    }))
}

/// 训练的全部组（含动作名）
///
/// GET /workouts/:id/sets
async fn list_workout_sets(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(success(state.db.sets_for_workout(id, user.user_id).await?))
}

/// 删除训练中某个动作的全部组
///
/// DELETE /workouts/:id/exercises/:exercise_id
async fn delete_exercise_sets(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath((workout_id, exercise_id)): ApiPath<(i32, i32)>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state
        .db
        .delete_sets_for_exercise(user.user_id, workout_id, exercise_id)
        .await?;

    info!(workout_id, exercise_id, deleted, "Exercise sets deleted");
    Ok(success(DeletedExerciseSets {
        workout_id,
        exercise_id,
        deleted,
    }))
}

/// 部分更新单个训练组
///
/// PATCH /workouts/:id/exercises/:exercise_id/sets/:set_number
async fn update_set(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(key): ApiPath<(i32, i32, i32)>,
    ApiJson(request): ApiJson<UpdateWorkoutSetRequest>,
) -> ApiResult<impl IntoResponse> {
    let changes = request.validate().map_err(ApiError::bad_request)?;
    let set = state.db.update_workout_set(user.user_id, key, changes).await?;
    Ok(success(set))
}

/// DELETE /workouts/:id/exercises/:exercise_id/sets/:set_number
async fn delete_set(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiPath(key): ApiPath<(i32, i32, i32)>,
) -> ApiResult<impl IntoResponse> {
    let set = state.db.delete_workout_set(user.user_id, key).await?;

    info!(
        workout_id = key.0,
        exercise_id = key.1,
        set_number = key.2,
        "Workout set deleted"
    );
    Ok(success(set))
}
