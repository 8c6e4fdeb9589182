use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod sampling;
pub mod store;

use mcp::prompts::PromptRegistry;
use mcp::tools::{RegistryError, ToolRegistry};
use sampling::SamplingBridge;
use store::FreightStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FreightStore>,
    pub tools: Arc<ToolRegistry>,
    pub prompts: Arc<PromptRegistry>,
    pub sampling: Arc<SamplingBridge>,
}

impl AppState {
    /// Wire the registries from the domain modules. A duplicate tool or
    /// prompt name anywhere is a startup failure, not a silent override.
    pub fn new(
        store: Arc<dyn FreightStore>,
        sampling: Arc<SamplingBridge>,
    ) -> Result<Self, RegistryError> {
        let tools = Arc::new(ToolRegistry::build(domain::tool_modules())?);
        let prompts = Arc::new(PromptRegistry::build(domain::prompts::prompts())?);
        Ok(Self {
            store,
            tools,
            prompts,
            sampling,
        })
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
