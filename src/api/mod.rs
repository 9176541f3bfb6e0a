//! API 模块
//!
//! HTTP handlers 和路由组装

pub mod auth;
pub mod exercises;
pub mod health;
pub mod muscles;
pub mod response;
pub mod user_profiles;
pub mod users;
pub mod workout_sets;
pub mod workouts;

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::ApiError;
use crate::middleware::{host::allowed_hosts, rate_limit::rate_limit};
use crate::state::AppState;
use crate::web;

/// 构建完整的路由
///
/// 请求依次经过 trace、CORS、Host 白名单、限流、超时与请求体上限
pub fn router(state: Arc<AppState>) -> Router {
    let app = Router::new()
        // Health
        .merge(health::router())
        // Auth
        .merge(auth::router())
        // Users & profiles
        .merge(users::router())
        .merge(user_profiles::router())
        // Muscles & exercises
        .merge(muscles::router())
        .merge(exercises::router())
        // Workouts
        .merge(workouts::router())
        .merge(workout_sets::router())
        // Landing page & PWA
        .merge(web::router(&state.config.static_dir))
        .fallback(route_not_found);

    with_middleware(app, state)
}

/// 挂载中间件并注入状态
fn with_middleware(app: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    let server = &state.config.server;

    let mut app = app
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TimeoutLayer::new(server.request_timeout))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), allowed_hosts));

    if server.cors_enabled {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::constants::MIN_BCRYPT_COST;
    use crate::config::EnvConfig;
    use crate::state::Database;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_config() -> EnvConfig {
        let mut config = EnvConfig::default();
        config.bcrypt_cost = MIN_BCRYPT_COST;
        config.rate_limit.burst = 10_000.0;
        config
    }

    fn app_with(config: EnvConfig) -> Router {
        router(Arc::new(AppState::new(config, Database::in_memory())))
    }

    fn app() -> Router {
        app_with(test_config())
    }

    struct Call<'a> {
        method: &'a str,
        uri: &'a str,
        token: Option<&'a str>,
        body: Option<Value>,
        headers: Vec<(&'a str, &'a str)>,
    }

    impl<'a> Call<'a> {
        fn new(method: &'a str, uri: &'a str) -> Self {
            Self {
                method,
                uri,
                token: None,
                body: None,
                headers: Vec::new(),
            }
        }

        fn token(mut self, token: &'a str) -> Self {
            self.token = Some(token);
            self
        }

        fn json(mut self, body: Value) -> Self {
            self.body = Some(body);
            self
        }

        fn header(mut self, name: &'a str, value: &'a str) -> Self {
            self.headers.push((name, value));
            self
        }

        async fn send(self, app: &Router) -> (StatusCode, Value) {
            let mut builder = Request::builder()
                .method(self.method)
                .uri(self.uri)
                .header(header::HOST, "localhost:8080");
            if let Some(token) = self.token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
            }
            for (name, value) in self.headers {
                builder = builder.header(name, value);
            }
            let request = match self.body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, body)
        }
    }

    /// 注册并登录，返回 (user_id, access_token, refresh_token)
    async fn sign_up(app: &Router, email: &str, username: &str) -> (i32, String, String) {
        let (status, body) = Call::new("POST", "/users")
            .json(json!({"email": email, "password": "password123", "username": username}))
            .send(app)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let user_id = body["data"]["user_id"].as_i64().unwrap() as i32;

        let (status, body) = Call::new("POST", "/login")
            .json(json!({"email": email, "password": "password123"}))
            .send(app)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (
            user_id,
            body["data"]["access_token"].as_str().unwrap().to_string(),
            body["data"]["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health_envelope() {
        let app = app();
        let (status, body) = Call::new("GET", "/health").send(&app).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["counts"]["users"], 0);
        assert_eq!(body["data"]["oauth_configured"], false);
    }

    #[tokio::test]
    async fn test_unknown_route_and_host() {
        let app = app();
        let (status, body) = Call::new("GET", "/nope").send(&app).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Route not found");

        let request = Request::builder()
            .uri("/health")
            .header(header::HOST, "evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_landing_page_and_pwa_shell() {
        let app = app();
        let request = Request::builder()
            .uri("/")
            .header(header::HOST, "reppy.io")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Sign in with Google"));

        let request = Request::builder()
            .uri("/manifest.webmanifest")
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/manifest+json"
        );

        let request = Request::builder()
            .uri("/sw.js")
            .header(header::HOST, "localhost")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
    }

    #[tokio::test]
    async fn test_manifest_icons_are_served() {
        let mut config = test_config();
        config.static_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("public");
        let app = app_with(config);

        for icon in crate::web::WebManifest::reppy().icons {
            let request = Request::builder()
                .uri(&icon.src)
                .header(header::HOST, "localhost")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", icon.src);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        }
    }

    #[tokio::test]
    async fn test_protected_routes_require_bearer() {
        let app = app();
        let (status, body) = Call::new("GET", "/workouts").send(&app).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing authorization header");

        let (status, body) = Call::new("GET", "/workouts")
            .header("authorization", "Token abc")
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid authorization format");

        let (status, body) = Call::new("GET", "/workouts")
            .token("garbage")
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_signup_validation_and_conflicts() {
        let app = app();
        let (status, _) = Call::new("POST", "/users")
            .json(json!({"email": "a@test.com"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = Call::new("POST", "/users")
            .json(json!({"email": "a@test.com", "password": "short", "username": "alpha"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password must be at least 8 characters");

        sign_up(&app, "a@test.com", "alpha").await;
        let (status, body) = Call::new("POST", "/users")
            .json(json!({"email": "A@test.com", "password": "password123", "username": "other"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already in use");
        assert_eq!(body["code"], "conflict");

        let (status, body) = Call::new("POST", "/login")
            .json(json!({"email": "a@test.com", "password": "wrong-password"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, body) = Call::new("POST", "/login")
            .json(json!({"email": "", "password": ""}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email and password are required");
    }

    #[tokio::test]
    async fn test_refresh_rotates_tokens() {
        let app = app();
        let (_, _, refresh) = sign_up(&app, "a@test.com", "alpha").await;

        let (status, body) = Call::new("POST", "/refresh")
            .json(json!({"refresh_token": "short"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid refresh token format");

        let (status, body) = Call::new("POST", "/refresh")
            .json(json!({"refresh_token": refresh}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        let new_refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

        // 旧 refresh token 已作废
        let (status, _) = Call::new("POST", "/refresh")
            .json(json!({"refresh_token": refresh}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = Call::new("POST", "/logout")
            .json(json!({"refresh_token": new_refresh}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = Call::new("POST", "/refresh")
            .json(json!({"refresh_token": new_refresh}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_rotates_once() {
        let app = app();
        let (_, _, refresh) = sign_up(&app, "a@test.com", "alpha").await;

        let body = json!({"refresh_token": refresh});
        let (first, second) = tokio::join!(
            Call::new("POST", "/refresh").json(body.clone()).send(&app),
            Call::new("POST", "/refresh").json(body).send(&app),
        );
        let succeeded = [first.0, second.0]
            .iter()
            .filter(|status| **status == StatusCode::OK)
            .count();
        assert_eq!(succeeded, 1);
    }

    #[tokio::test]
    async fn test_users_can_only_modify_themselves() {
        let app = app();
        let (alpha_id, alpha_token, _) = sign_up(&app, "a@test.com", "alpha").await;
        let (beta_id, _, _) = sign_up(&app, "b@test.com", "beta").await;

        let uri = format!("/users/{}", beta_id);
        let (status, _) = Call::new("PATCH", &uri)
            .token(&alpha_token)
            .json(json!({"username": "hijacked"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let uri = format!("/users/{}", alpha_id);
        let (status, body) = Call::new("PATCH", &uri)
            .token(&alpha_token)
            .json(json!({"username": "alpha2"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alpha2");
        assert!(body["data"].get("password_hash").is_none());

        let (status, body) = Call::new("GET", "/users/999")
            .token(&alpha_token)
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");

        let (status, body) = Call::new("GET", "/users/abc")
            .token(&alpha_token)
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid path parameter");
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_rejected() {
        let app = app();
        let (user_id, token, _) = sign_up(&app, "a@test.com", "alpha").await;

        let uri = format!("/users/{}", user_id);
        let (status, _) = Call::new("DELETE", &uri).token(&token).send(&app).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = Call::new("GET", "/workouts").token(&token).send(&app).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");

        let (status, _) = Call::new("POST", "/muscles")
            .token(&token)
            .json(json!({"muscle_name": "Ghost", "muscle_group": "Arms"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = Call::new("POST", "/workouts")
            .token(&token)
            .json(json!({"clientworkoutdate": "2024-05-01T10:00:00Z"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let app = app();
        let (user_id, token, _) = sign_up(&app, "a@test.com", "alpha").await;

        let (status, body) = Call::new("POST", "/user-profiles")
            .token(&token)
            .json(json!({"first_name": "Aaron", "date_of_birth": "1999-11-19", "height_inches": 74}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["date_of_birth"], "1999-11-19");

        let uri = format!("/user-profiles/{}", user_id);
        let (status, body) = Call::new("PATCH", &uri)
            .token(&token)
            .json(json!({"date_of_birth": "19/11/1999"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid date format for date_of_birth; use YYYY-MM-DD"
        );

        let (status, body) = Call::new("GET", "/user-profiles")
            .token(&token)
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, _) = Call::new("DELETE", &uri).token(&token).send(&app).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = Call::new("GET", &uri).token(&token).send(&app).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User profile not found");
    }

    #[tokio::test]
    async fn test_workout_flow() {
        let app = app();
        let (_, token, _) = sign_up(&app, "a@test.com", "alpha").await;

        let (status, body) = Call::new("POST", "/exercises")
            .token(&token)
            .json(json!({"exercise_name": "Pull-up"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let exercise_id = body["data"]["exercise_id"].as_i64().unwrap();

        // 芝加哥 23:30 = UTC 次日 05:30，训练日期取本地日期
        let (status, body) = Call::new("POST", "/workouts")
            .token(&token)
            .header("x-user-timezone", "America/Chicago")
            .json(json!({"title": "Upper Body", "clientworkoutdate": "2025-03-01T05:30:00Z"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["workout_date"], "2025-02-28");
        let workout_id = body["data"]["workout_id"].as_i64().unwrap();

        let (status, body) = Call::new("POST", "/workouts")
            .token(&token)
            .header("x-user-timezone", "Mars/Olympus")
            .json(json!({"clientworkoutdate": "2025-03-02"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("invalid timezone"));

        let set = json!({"workout_id": workout_id, "exercise_id": exercise_id, "set_number": 9,
                         "reps": 8, "resistance_type": "bodyweight", "rpe": 8.5});
        let (status, body) = Call::new("POST", "/workout-sets")
            .token(&token)
            .json(json!({"sets": [set.clone(), set]}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let numbers: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["set_number"].as_i64().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2]);

        let (status, body) = Call::new("GET", "/workout-sets?date=2025-02-28")
            .token(&token)
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["exercise_name"], "Pull-up");

        let uri = format!("/workouts/{}/exercises/{}/sets/2", workout_id, exercise_id);
        let (status, body) = Call::new("PATCH", &uri)
            .token(&token)
            .json(json!({"reps": 7, "notes": "Barely 7"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reps"], 7);

        let (status, body) = Call::new("GET", "/workouts/date?date=2025-02-28")
            .token(&token)
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Upper Body");

        let uri = format!("/workouts/{}", workout_id);
        let (status, body) = Call::new("DELETE", &uri).token(&token).send(&app).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["message"], "Workout deleted successfully");

        let (status, body) = Call::new("GET", "/workout-sets?date=2025-02-28")
            .token(&token)
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_workouts_are_private() {
        let app = app();
        let (_, owner_token, _) = sign_up(&app, "a@test.com", "alpha").await;
        let (_, other_token, _) = sign_up(&app, "b@test.com", "beta").await;

        let (_, body) = Call::new("POST", "/workouts")
            .token(&owner_token)
            .json(json!({"clientworkoutdate": "2025-01-01"}))
            .send(&app)
            .await;
        let uri = format!("/workouts/{}", body["data"]["workout_id"]);

        let (status, body) = Call::new("GET", &uri).token(&other_token).send(&app).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Workout not found");

        let (status, _) = Call::new("GET", &uri).token(&owner_token).send(&app).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_muscle_lookup() {
        let app = app();
        let (_, token, _) = sign_up(&app, "a@test.com", "alpha").await;
        let (status, _) = Call::new("POST", "/muscles")
            .token(&token)
            .json(json!({"muscle_name": "Quadriceps", "muscle_group": "Legs"}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = Call::new("GET", "/muscles?name=quadriceps").send(&app).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["muscle_group"], "Legs");

        let (status, body) = Call::new("GET", "/muscles?name=Biceps").send(&app).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Muscle not found");

        let (status, _) = Call::new("DELETE", "/muscles").token(&token).send(&app).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rate_limit_and_body_limit() {
        let mut config = test_config();
        config.rate_limit.burst = 2.0;
        config.rate_limit.per_second = 0.0;
        let app = app_with(config);

        assert_eq!(Call::new("GET", "/health").send(&app).await.0, StatusCode::OK);
        assert_eq!(Call::new("GET", "/health").send(&app).await.0, StatusCode::OK);
        let (status, body) = Call::new("GET", "/health").send(&app).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limit exceeded");

        let mut config = test_config();
        config.server.max_body_bytes = 64;
        let app = app_with(config);
        let (status, body) = Call::new("POST", "/login")
            .json(json!({"email": "a@test.com", "password": "x".repeat(200)}))
            .send(&app)
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let mut config = test_config();
        config.server.request_timeout = Duration::from_millis(20);
        let state = Arc::new(AppState::new(config, Database::in_memory()));

        let slow = Router::new().route(
            "/slow",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_middleware(slow, state);

        let (status, _) = Call::new("GET", "/slow").send(&app).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }
}
