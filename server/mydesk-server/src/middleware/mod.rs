//! Request middleware and extractors

pub mod auth_context;

pub use auth_context::{AuthContext, MaybeAuth};

use axum::extract::Request;
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use std::time::{Duration, Instant};
use tower_http::cors::{Any, CorsLayer};

/// Requests slower than this are logged at warn level
const SLOW_REQUEST: Duration = Duration::from_secs(1);

/// Log slow requests
pub async fn request_timing_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    if duration > SLOW_REQUEST {
        tracing::warn!(
            %method,
            path = %path,
            status = response.status().as_u16(),
            duration_ms = duration.as_millis(),
            "Slow request detected"
        );
    }
    response
}

/// CORS for the browser client; credentials travel in the Authorization header
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}
