use std::sync::Arc;

use arena_api::{config::ServerConfig, state::AppState, sweeper::spawn_idle_sweeper};
use arena_core::{
    config::GameSettings, repositories::room_registry::RoomRegistry,
    services::openai_suggester::OpenAiSuggester, services::room_service::RoomService,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = GameSettings::from_env().map_err(|e| {
        error!("Invalid game settings: {}", e);
        e
    })?;
    let server = ServerConfig::from_env().map_err(|e| {
        error!("Invalid server config: {}", e);
        e
    })?;

    // Set up services
    let registry = Arc::new(RoomRegistry::new(settings.clone()));
    let suggester = Arc::new(OpenAiSuggester::new());
    let room_service = Arc::new(RoomService::new(registry, suggester, &settings));

    let shutdown = CancellationToken::new();
    let sweeper = spawn_idle_sweeper(
        room_service.clone(),
        server.sweep_interval,
        server.room_idle_timeout,
        shutdown.clone(),
    );

    let app = arena_api::app(AppState { room_service });
    let listener = tokio::net::TcpListener::bind(server.bind_addr).await?;
    info!(
        addr = %server.bind_addr,
        board_size = settings.board_size,
        require_all_ready = settings.require_all_ready,
        "Gomoku arena listening"
    );

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down");
            signal.cancel();
        })
        .await?;

    shutdown.cancel();
    sweeper.await?;
    Ok(())
}
