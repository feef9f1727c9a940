use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = voterd::config::Cli::parse();
    let cmd = cli.command.clone().unwrap_or(voterd::config::Command::Run);

    match cmd {
        voterd::config::Command::Run => run_server(cli.config).await,
    }
}

async fn run_server(config: voterd::config::Config) -> Result<()> {
    let store = Arc::new(voterd::store::VoterStore::new());

    let app = voterd::http::build_router(store)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!(bind = %config.bind, version = voterd::version::VERSION, "starting voterd");
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).compact().init();
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
