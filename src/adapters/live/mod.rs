//! Live adapters that call the real generation APIs.

pub mod gemini;
pub mod openai;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::ArtError;

const MAX_BODY_EXCERPT: usize = 500;

/// Build an HTTP client with the request timeout applied.
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ArtError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ArtError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Turn a non-success HTTP response into a displayable failure.
///
/// Both providers report errors as `{"error": {"message": ...}}`; anything
/// else is quoted as a truncated body.
pub(crate) fn api_failure(status: StatusCode, body: &str) -> ArtError {
    #[derive(Deserialize)]
    struct Envelope {
        error: Detail,
    }
    #[derive(Deserialize)]
    struct Detail {
        message: Option<String>,
        code: Option<serde_json::Value>,
    }

    let detail = serde_json::from_str::<Envelope>(body).ok().map(|e| e.error);
    let message = detail.as_ref().and_then(|d| d.message.as_deref()).unwrap_or_default();
    let is_policy = detail
        .as_ref()
        .and_then(|d| d.code.as_ref())
        .and_then(serde_json::Value::as_str)
        .is_some_and(|code| code.contains("moderation") || code.contains("safety"));

    if is_policy {
        ArtError::generation(format!("Request rejected by content policy: {message}"))
    } else if !message.is_empty() {
        ArtError::generation(format!("{message} (HTTP {})", status.as_u16()))
    } else if body.trim().is_empty() {
        ArtError::generation(format!("Service returned HTTP {}", status.as_u16()))
    } else {
        ArtError::generation(format!("Service returned HTTP {}: {}", status.as_u16(), excerpt(body)))
    }
}

/// First few hundred characters of a response body.
pub(crate) fn excerpt(body: &str) -> String {
    if body.chars().count() > MAX_BODY_EXCERPT {
        let cut: String = body.chars().take(MAX_BODY_EXCERPT).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ArtError) -> String {
        match err {
            ArtError::GenerationFailure { message } => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn failure_uses_error_envelope_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let msg = message(api_failure(StatusCode::BAD_REQUEST, body));
        assert_eq!(msg, "API key not valid (HTTP 400)");
    }

    #[test]
    fn failure_flags_moderation_code() {
        let body = r#"{"error": {"code": "moderation_blocked", "message": "Your request was rejected"}}"#;
        let msg = message(api_failure(StatusCode::BAD_REQUEST, body));
        assert!(msg.starts_with("Request rejected by content policy"));
    }

    #[test]
    fn failure_quotes_unstructured_body() {
        let msg = message(api_failure(StatusCode::BAD_GATEWAY, "<html>upstream down</html>"));
        assert_eq!(msg, "Service returned HTTP 502: <html>upstream down</html>");
    }

    #[test]
    fn failure_with_empty_body_is_not_empty() {
        let msg = message(api_failure(StatusCode::SERVICE_UNAVAILABLE, ""));
        assert_eq!(msg, "Service returned HTTP 503");
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(2000);
        let cut = excerpt(&long);
        assert_eq!(cut.len(), MAX_BODY_EXCERPT + 3);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let long = "é".repeat(600);
        assert!(excerpt(&long).ends_with("..."));
    }
}
