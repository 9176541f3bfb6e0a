//! 健康检查 API
//!
//! GET /health

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::{SERVICE_NAME, VERSION};
use crate::state::{store::StoreCounts, AppState};

use super::response::success;

/// 健康检查响应
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    uptime_secs: i64,
    persistent: bool,
    oauth_configured: bool,
    counts: StoreCounts,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// 健康检查，无需认证
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    success(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: VERSION,
        timestamp: Utc::now().to_rfc3339(),
        uptime_secs: state.uptime_secs(),
        persistent: state.config.data_dir.is_some(),
        oauth_configured: state.config.oauth.is_configured(),
        counts: state.db.counts().await,
    })
}
