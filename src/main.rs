use std::sync::Arc;

use freight_network_mcp::{
    build_app, config::Config, logging, sampling::SamplingBridge, store::InMemoryStore, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let store = Arc::new(InMemoryStore::new());
    let sampling = Arc::new(SamplingBridge::new());

    let state = AppState::new(store, sampling)?;
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(config.bind_socket()?).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
