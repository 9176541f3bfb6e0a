//! Reppy - 训练记录服务
//!
//! 提供训练记录 REST API，同时托管落地页与 PWA 外壳

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod services;
pub mod state;
pub mod web;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use config::EnvConfig;
pub use logging::{init_logging, LogFormat};

use config::env::constants::VERSION;
use services::seeder;
use state::{
    app_state::{get_shutdown_token, trigger_shutdown},
    AppState, Database, SnapshotFile,
};

/// 启动服务，直到收到关闭信号
///
/// 端口绑定失败直接返回错误，不会尝试其他端口
pub async fn run(config: EnvConfig) -> anyhow::Result<()> {
    let db = match &config.data_dir {
        Some(dir) => Database::open(SnapshotFile::in_dir(dir)).await,
        None => {
            info!("DATA_DIR not set, data will be kept in memory only");
            Database::in_memory()
        }
    };

    if config.seed_test_data {
        if let Err(e) = seeder::seed_if_empty(&db, config.bcrypt_cost).await {
            warn!(error = %format!("{:#}", e), "Failed to seed test data, continuing");
        }
    }

    let bind_addr = config.server.bind_addr();
    let state = Arc::new(AppState::new(config, db));

    let shutdown = get_shutdown_token();
    let sweeper = state.spawn_sweepers(shutdown.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, version = VERSION, "Reppy listening");

    let app = api::router(state.clone());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown))
    .await
    .context("server error")?;

    trigger_shutdown();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Sweeper task failed");
    }

    state
        .db
        .flush()
        .await
        .context("failed to write final snapshot")?;
    info!("Reppy stopped");
    Ok(())
}

/// Ctrl-C、SIGTERM 或全局 token 取消时返回
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }

    info!("Shutdown signal received");
    token.cancel();
}
