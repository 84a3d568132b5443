use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use medinv_core::Actor;
use medinv_core::validation::validate_email;

use crate::app::errors;
use crate::context::ActorContext;

/// Header carrying the authenticated e-mail, set by the fronting proxy.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Clone)]
pub struct AuthState {
    /// Suffix every accepted identity must end with (e.g. `@example.org`),
    /// stored lowercased.
    allowed_domain: String,
}

impl AuthState {
    pub fn new(allowed_domain: &str) -> Self {
        Self {
            allowed_domain: allowed_domain.trim().to_lowercase(),
        }
    }

    /// `email` is expected already lowercased by [`extract_email`].
    fn admits(&self, email: &str) -> bool {
        validate_email(email) && email.ends_with(&self.allowed_domain)
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let email = match extract_email(req.headers()) {
        Some(email) => email,
        None => {
            warn!(path = %req.uri().path(), "request without identity rejected");
            return errors::failure(StatusCode::FORBIDDEN, "access denied: no authenticated user");
        }
    };

    if !state.admits(&email) {
        warn!(email = %email, path = %req.uri().path(), "identity outside allowed domain rejected");
        return errors::failure(
            StatusCode::FORBIDDEN,
            format!("access denied: only {} accounts may use this system", state.allowed_domain),
        );
    }

    req.extensions_mut().insert(ActorContext::new(Actor::new(email)));
    next.run(req).await
}

fn extract_email(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(USER_EMAIL_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn email_header_is_trimmed_and_lowercased() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("  Nurse@Example.org "));
        assert_eq!(extract_email(&headers).as_deref(), Some("nurse@example.org"));
    }

    #[test]
    fn blank_or_missing_header_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_email(&headers), None);
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_email(&headers), None);
    }

    #[test]
    fn mixed_case_domain_admits_members() {
        let state = AuthState::new("@Example.ORG");
        let mut headers = HeaderMap::new();
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("Nurse@example.org"));
        let email = extract_email(&headers).unwrap();
        assert!(state.admits(&email));
        assert!(!state.admits("nurse@example.org.evil.com"));
        assert!(!state.admits("not-an-email@example.org@"));
    }
}
