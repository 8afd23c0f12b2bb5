//! docgate-server - authenticated document extraction gateway.
//!
//! Accepts uploads and text over HTTP, hands each request to a bounded
//! worker pool, and returns whatever the matching extractor produced.
//!
//! # Example
//!
//! ```ignore
//! use docgate_extractors::{ChatConfig, ExtractorRegistry, VisionConfig};
//! use docgate_server::{config::ServerConfig, create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::from_env().unwrap();
//!     let registry = ExtractorRegistry::with_defaults(ChatConfig::from_env(), VisionConfig::from_env());
//!     let app = create_server(AppState::from_config(&config, registry));
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr().unwrap()).await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use dispatch::{DispatchError, Dispatcher, WorkerPool};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
