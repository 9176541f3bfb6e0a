//! 应用状态

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::env::constants::{RATE_LIMIT_IDLE_SECS, SWEEP_INTERVAL_SECS};
use crate::config::EnvConfig;
use crate::services::{JwtService, RateLimiter};

use super::store::Database;

/// 全局 shutdown token，用于优雅关闭所有后台任务
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN.get_or_init(CancellationToken::new).clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

/// 应用状态
pub struct AppState {
    /// 环境配置
    pub config: EnvConfig,
    /// 数据存储
    pub db: Database,
    /// JWT 服务
    pub jwt: JwtService,
    /// 按客户端 IP 限流
    pub rate_limiter: RateLimiter,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: EnvConfig, db: Database) -> Self {
        tracing::info!(
            host = %config.server.host,
            port = config.server.port,
            allowed_hosts = ?config.server.allowed_hosts,
            cors = config.server.cors_enabled,
            persistent = config.data_dir.is_some(),
            oauth_configured = config.oauth.is_configured(),
            "Loaded configuration"
        );

        Self {
            jwt: JwtService::new(config.jwt.clone()),
            rate_limiter: RateLimiter::new(&config.rate_limit),
            db,
            config,
            started_at: Utc::now(),
        }
    }

    /// 运行时长（秒）
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 启动后台清理任务（黑名单、限流桶），收到 shutdown 后退出
    pub fn spawn_sweepers(self: &Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let tokens = state.jwt.sweep().await;
                        let buckets = state
                            .rate_limiter
                            .sweep(Duration::from_secs(RATE_LIMIT_IDLE_SECS));
                        if tokens > 0 || buckets > 0 {
                            debug!(tokens, buckets, "Swept expired entries");
                        }
                    }
                }
            }
            debug!("Sweeper stopped");
        })
    }
}
