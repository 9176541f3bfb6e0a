//! Host 白名单

use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// 拒绝 Host 不在白名单内的请求
pub async fn allowed_hosts(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = &state.config.server.allowed_hosts;
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host());

    if is_host_allowed(host, allowed) {
        next.run(request).await
    } else {
        tracing::warn!(host = ?host, "Rejected request for unknown host");
        ApiError::forbidden("Host not allowed").into_response()
    }
}

/// 白名单为空时放行所有请求；比较时忽略端口与大小写
pub fn is_host_allowed(host: Option<&str>, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(host) = host else {
        return false;
    };
    let name = strip_port(host.trim());
    allowed.iter().any(|a| a.eq_ignore_ascii_case(name))
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 字面量 `[::1]:8080`
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split_once(':').map_or(host, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> Vec<String> {
        vec!["reppy.io".to_string(), "localhost".to_string()]
    }

    #[test]
    fn test_host_allowed_ignores_port_and_case() {
        let allowed = allow_list();
        assert!(is_host_allowed(Some("reppy.io"), &allowed));
        assert!(is_host_allowed(Some("LOCALHOST:8080"), &allowed));
        assert!(!is_host_allowed(Some("evil.com"), &allowed));
        assert!(!is_host_allowed(Some("reppy.io.evil.com"), &allowed));
    }

    #[test]
    fn test_missing_host() {
        assert!(!is_host_allowed(None, &allow_list()));
        assert!(is_host_allowed(None, &[]));
    }

    #[test]
    fn test_ipv6_host() {
        let allowed = vec!["[::1]".to_string()];
        assert!(is_host_allowed(Some("[::1]:8080"), &allowed));
        assert_eq!(strip_port("[::1]"), "[::1]");
    }
}
