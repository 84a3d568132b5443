use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, warn};

use medinv_core::DomainError;

/// Correlation code attached to every failure: `ERR_<millis>_<5 chars>`.
pub fn error_code(now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("ERR_{}_{suffix}", now.timestamp_millis())
}

/// Failure envelope: `{ success: false, message, error_code, timestamp }`.
pub fn failure(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    let now = Utc::now();
    (
        status,
        axum::Json(json!({
            "success": false,
            "message": message.into(),
            "error_code": error_code(now),
            "timestamp": now.to_rfc3339(),
        })),
    )
        .into_response()
}

/// Success envelope; the fields of `data` are merged into the top level.
pub fn success(message: impl Into<String>, data: Value) -> axum::response::Response {
    let mut body = json!({
        "success": true,
        "message": message.into(),
    });
    if let (Some(obj), Value::Object(extra)) = (body.as_object_mut(), data) {
        obj.extend(extra);
    }
    (StatusCode::OK, axum::Json(body)).into_response()
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::DuplicateCode(_) => StatusCode::CONFLICT,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(kind = err.kind(), error = %err, "request failed");
    } else {
        warn!(kind = err.kind(), error = %err, "request rejected");
    }
    failure(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_has_expected_shape() {
        let now = Utc::now();
        let code = error_code(now);
        let parts: Vec<&str> = code.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ERR");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(status_for(&DomainError::validation("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&DomainError::duplicate_code("EM-AGE-001-0824")), StatusCode::CONFLICT);
        assert_eq!(status_for(&DomainError::not_found("item")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&DomainError::storage("disk")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
