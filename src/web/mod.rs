//! 落地页与 PWA 外壳
//!
//! `/`、`/manifest.webmanifest`、`/sw.js` 与 `/assets/*` 静态资源

pub mod landing;
pub mod manifest;
pub mod sw;

use axum::{
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tower_http::services::ServeDir;

use crate::config::env::constants::VERSION;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub use landing::{render_landing_page, LandingPage};
pub use manifest::WebManifest;
pub use sw::service_worker_script;

/// 创建页面路由
pub fn router(static_dir: &Path) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing_page))
        .route("/manifest.webmanifest", get(web_manifest))
        .route("/sw.js", get(service_worker))
        .nest_service("/assets", ServeDir::new(static_dir))
}

/// GET /
async fn landing_page() -> impl IntoResponse {
    static PAGE: OnceLock<String> = OnceLock::new();
    Html(PAGE.get_or_init(|| render_landing_page(&LandingPage::default())).as_str())
}

/// GET /manifest.webmanifest
async fn web_manifest() -> ApiResult<impl IntoResponse> {
    let body = serde_json::to_string(&WebManifest::reppy())
        .map_err(|e| ApiError::internal(format!("failed to serialize manifest: {}", e)))?;
    Ok(([(CONTENT_TYPE, "application/manifest+json")], body))
}

/// GET /sw.js
///
/// 不缓存脚本本身，浏览器每次都能检查更新
async fn service_worker() -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, "application/javascript"),
            (CACHE_CONTROL, "no-cache"),
        ],
        service_worker_script(&sw::cache_name(VERSION)),
    )
}
