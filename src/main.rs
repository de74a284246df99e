use anyhow::Result;
use clap::Parser;
use live_interview::{create_router, AppState, Config};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "live-interview", about = "Time-boxed live interview orchestrator")]
struct Cli {
    /// Config file base name (TOML), without extension
    #[arg(long, default_value = "config/live-interview")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Interview duration bounds: {}s - {}s",
        cfg.interview.min_duration_secs, cfg.interview.max_duration_secs
    );

    let state = AppState::new(cfg.nats.url.clone(), cfg.interview.clone());
    let registry = state.registry.clone();
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    let shutdown_timeout = Duration::from_secs(cfg.service.shutdown_timeout_secs);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
            // Sweep before the connection drain: completing a session
            // closes its outbound stream, which ends any per-session
            // socket still holding a connection open.
            registry.shutdown_all(shutdown_timeout).await;
        })
        .await?;

    info!("Shutdown complete");
    Ok(())
}
