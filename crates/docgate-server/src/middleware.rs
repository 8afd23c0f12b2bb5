//! Middleware for the REST API server.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::auth::{authorize, AuthDecision};
use crate::error::ApiError;
use crate::state::AppState;

/// Create CORS middleware.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Request logging middleware.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

/// Bearer-token gate for the `/api` routes.
///
/// Runs before any extractor touches the request body, so a rejected
/// request never reaches a backend.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    match authorize(state.verifier.as_ref(), header.as_deref()).await {
        AuthDecision::Authorized => next.run(request).await,
        AuthDecision::Unauthorized(reason) => {
            debug!(uri = %request.uri(), reason, "Rejected unauthenticated request");
            ApiError::unauthorized(reason).into_response()
        }
    }
}
