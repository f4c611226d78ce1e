//! obs-lab: a small HTTP service instrumented end to end.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                      OBS-LAB                       │
//!                     │                                                    │
//!   Client Request    │  ┌────────────┐   ┌──────────────┐   ┌──────────┐  │
//!   ──────────────────┼─▶│ request id │──▶│ access log + │──▶│  router  │  │
//!                     │  │  (adopt or │   │   metrics    │   │ admin/api│  │
//!                     │  │  generate) │   └──────┬───────┘   └────┬─────┘  │
//!                     │  └────────────┘          │                │        │
//!   Client Response   │                          ▼                ▼        │
//!   ◀─────────────────┼──────────────────  HttpMetrics       AppError /    │
//!                     │                    (GET /metrics)    panic → 500   │
//!                     │                                                    │
//!                     │  logs/app-YYYY-MM-DD.log   logs/exceptions.log     │
//!                     │  logs/*.log.gz (rotated)   logs/rejections.log     │
//!                     └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use obs_lab::config::resolve_config;
use obs_lab::lifecycle::{signals, Shutdown};
use obs_lab::observability::{init_logging, process, spawn_supervised, CrashLog, HttpMetrics};
use obs_lab::HttpServer;

#[derive(Parser)]
#[command(name = "obs-lab")]
#[command(about = "Observability demo HTTP service", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "OBS_LAB_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port; overrides the configuration file.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    process::mark_start();
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref(), args.port)?;

    let crash_log = CrashLog::new(&config.logging.directory, &config.logging.service_name);
    crash_log.install_panic_hook();

    let _logging = init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        log_directory = %config.logging.directory,
        "Configuration loaded"
    );

    let metrics = HttpMetrics::new(&config.metrics)?;
    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, metrics);
    let server_task = spawn_supervised(crash_log, "http-server", async move {
        server.run(listener, server_shutdown).await
    });

    shutdown
        .run_until("http-server", server_task, signals::wait_for_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
