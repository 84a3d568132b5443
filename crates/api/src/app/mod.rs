//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage and maintenance wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and JSON parsing helpers
//! - `errors.rs`: success/failure envelopes

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{build_services, AppServices};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState::new(&services.config().allowed_domain);
    // Base64 inflates photos by a third; leave room for the other fields.
    let body_limit = services.config().max_file_size / 3 * 4 + 64 * 1024;

    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(body_limit)))
}
