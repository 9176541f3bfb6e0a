//! 训练组 API
//!
//! POST /workout-sets 批量创建，GET /workout-sets?date= 按日期查询

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::domain::user::parse_date;
use crate::domain::workout::{CreateWorkoutSetsRequest, DateQuery};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{ApiJson, ApiQuery, RequireUser};
use crate::state::AppState;

use super::response::{created, success};

/// 创建训练组路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/workout-sets", get(sets_on_date).post(create_sets))
}

/// 批量创建
///
/// POST /workout-sets
async fn create_sets(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateWorkoutSetsRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.sets.is_empty() {
        return Err(ApiError::bad_request("At least one set is required"));
    }

    let sets = request
        .sets
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            input
                .validate()
                .map_err(|e| ApiError::bad_request(format!("sets[{}]: {}", i, e)))
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let created_sets = state.db.create_workout_sets(user.user_id, sets).await?;

    info!(user_id = user.user_id, count = created_sets.len(), "Workout sets created");
    Ok(created(created_sets))
}

/// 当前用户某天的全部组
///
/// GET /workout-sets?date=YYYY-MM-DD
async fn sets_on_date(
    user: RequireUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_date(&query.date)
        .ok_or_else(|| ApiError::bad_request("Invalid date format; use YYYY-MM-DD"))?;
    Ok(success(state.db.sets_for_user_on_date(user.user_id, date).await))
}
