use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "email": ctx.actor().email(),
        "name": ctx.actor().display_name(),
        "organization": services.config().organization_name,
    }))
}

/// Read-only consistency report over both tables.
pub async fn integrity(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.inventory.integrity_check() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
