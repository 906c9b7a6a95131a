use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use mkd_duck_ai::api::create_router_with_rate_limit;
use mkd_duck_ai::app::{AppState, spawn_worker};
use mkd_duck_ai::config::AppConfig;
use mkd_duck_ai::domain::ScenarioRepository;
use mkd_duck_ai::infra::{
    JwtService, PostgresClient, WebSearchEngine, init_metrics_handle, init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);
    let metrics = init_metrics_handle();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server_addr,
        "Starting DuckAI"
    );

    let postgres = PostgresClient::with_defaults(config.database_url.expose_secret()).await?;
    if config.run_migrations {
        postgres.run_migrations().await?;
    }
    let repository: Arc<dyn ScenarioRepository> = Arc::new(postgres);
    let web_search = Arc::new(WebSearchEngine::new(config.web_search)?);

    let mut state = AppState::new(repository, web_search).with_metrics(metrics);
    match config.jwt {
        Some(jwt) => {
            state = state.with_auth(JwtService::new(jwt, config.client_credentials));
        }
        None => warn!("JWT_SECRET not set, the learn endpoint is unprotected"),
    }
    let state = Arc::new(state);

    let loaded = state.responder.init().await?;
    info!(loaded, "Scenario set ready");

    let (worker_handle, shutdown_tx) = spawn_worker(Arc::clone(&state.responder), config.worker);

    let router = create_router_with_rate_limit(Arc::clone(&state), config.rate_limit);
    let listener = tokio::net::TcpListener::bind(config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    info!(addr = %config.server_addr, "Listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "Scenario reload worker ended abnormally");
    }
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
