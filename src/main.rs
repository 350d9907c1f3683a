// assist-governor - outbound LLM request governor
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use assist_governor::cli::Args;
use assist_governor::config::AppConfig;
use assist_governor::governor::Governor;
use assist_governor::server::create_router;
use assist_governor::utils::logging;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = AppConfig::load_from(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting assist-governor v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build provider lanes and start cache sweeps
    let governor = Arc::new(Governor::new(&config)?);
    governor.spawn_cleanup();
    for provider in governor.selector().available_providers() {
        info!(
            "Provider available: {} (priority {})",
            provider.name, provider.priority
        );
    }

    // Phase 4: Build and start HTTP server
    let app = create_router(config.clone(), Arc::clone(&governor))?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    governor.shutdown();
    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
