//! My Desk record server
//!
//! Serves the inward and outward registers (with their attachments),
//! attendance, tasks, profile and office list as JSON collections persisted
//! under a data directory. Every `/api` route except login requires a bearer
//! token; deletes and office list writes need the Incharge role.

#[macro_use]
pub mod validation;

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

pub use config::ServerConfig;
pub use error::{api_success, ApiError, ApiResponse, ApiResult};
pub use server::DeskServer;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::Router;
use routes::paths;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn create_app(server: DeskServer) -> Router {
    let inward_files = ServeDir::new(server.inward.attachments().dir());
    let outward_files = ServeDir::new(server.outward.attachments().dir());
    let max_body_bytes = server.config.max_body_bytes;

    routes::create_routes()
        .nest_service(paths::files::INWARD, inward_files)
        .nest_service(paths::files::OUTWARD, outward_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::create_cors_layer())
                .layer(from_fn(middleware::request_timing_middleware))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(server)
}
