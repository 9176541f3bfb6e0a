//! Reppy - 训练记录服务
//!
//! Usage:
//! - Default: `reppy` (0.0.0.0:8080, in-memory data)
//! - Custom port: `reppy --port 9090`
//! - Persistent data: `reppy --data-dir /var/lib/reppy`
//! - Skip test data: `reppy --no-seed`

use clap::Parser;
use std::path::PathBuf;

use reppy::{init_logging, EnvConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "reppy", version, about = "Reppy workout tracker API and PWA server")]
struct Cli {
    /// Override the listening address
    #[arg(long)]
    host: Option<String>,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,

    /// Directory for the JSON data snapshot
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Do not insert test data on an empty store
    #[arg(long)]
    no_seed: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    fn apply(self, config: &mut EnvConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        if self.no_seed {
            config.seed_test_data = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let mut config = EnvConfig::from_env();
    cli.apply(&mut config);

    reppy::run(config).await
}
