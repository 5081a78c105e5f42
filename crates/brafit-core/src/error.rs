//! Error values surfaced by the chat store, and the normalization of error
//! response bodies into a single human-readable message.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A failed exchange with the recommendation service.
///
/// Cloneable so that it can live inside published snapshots.
#[derive(Debug, Clone, Error)]
pub enum FittingError {
    /// The request never completed (DNS, refused connection, reset...).
    #[error("{0}")]
    Transport(Arc<reqwest::Error>),

    /// The service answered with a failing status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The service answered with success but the body wasn't a recommendation.
    #[error("Invalid recommendation payload: {0}")]
    Decode(Arc<serde_json::Error>),
}

impl FittingError {
    /// The text shown to the user. Consumers rely on nothing else.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FittingError::Api { status, .. } => Some(*status),
            FittingError::Transport(err) => err.status().map(|s| s.as_u16()),
            FittingError::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for FittingError {
    fn from(err: reqwest::Error) -> Self {
        FittingError::Transport(Arc::new(err))
    }
}

impl From<serde_json::Error> for FittingError {
    fn from(err: serde_json::Error) -> Self {
        FittingError::Decode(Arc::new(err))
    }
}

#[derive(Deserialize)]
struct ValidationIssue {
    msg: Option<String>,
}

#[derive(Deserialize)]
struct ValidationPayload {
    detail: Vec<ValidationIssue>,
}

#[derive(Deserialize)]
struct MessagePayload {
    message: String,
}

#[derive(Deserialize)]
struct DetailPayload {
    detail: String,
}

/// Known shapes of an error response body, in the order they are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// `{ "detail": [{ "msg": "..." }, ...] }`, first entry wins
    Validation(String),
    /// `{ "message": "..." }`
    Message(String),
    /// `{ "detail": "..." }`
    Detail(String),
    /// Anything else, kept as the body text the service sent
    Raw(String),
}

impl ErrorPayload {
    /// Classify a decoded body; `raw` is the body text it was decoded from.
    /// Returns `None` for falsy payloads (`null`, `false`, `0`, `""`), which
    /// carry no message at all. Empty strings never count as a message.
    pub fn classify(payload: &Value, raw: &str) -> Option<Self> {
        if is_falsy(payload) {
            return None;
        }

        if let Ok(validation) = ValidationPayload::deserialize(payload) {
            let first = validation.detail.into_iter().next().and_then(|issue| issue.msg);
            if let Some(msg) = first.filter(|m| !m.is_empty()) {
                return Some(ErrorPayload::Validation(msg));
            }
        }

        if let Ok(MessagePayload { message }) = MessagePayload::deserialize(payload) {
            if !message.is_empty() {
                return Some(ErrorPayload::Message(message));
            }
        }

        if let Ok(DetailPayload { detail }) = DetailPayload::deserialize(payload) {
            if !detail.is_empty() {
                return Some(ErrorPayload::Detail(detail));
            }
        }

        Some(ErrorPayload::Raw(raw.trim().to_string()))
    }

    pub fn into_message(self) -> String {
        match self {
            ErrorPayload::Validation(m)
            | ErrorPayload::Message(m)
            | ErrorPayload::Detail(m)
            | ErrorPayload::Raw(m) => m,
        }
    }
}

fn is_falsy(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Fallback used when the body yields nothing better.
pub fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("Request failed with status {}: {}", status.as_u16(), reason),
        None => format!("Request failed with status {}", status.as_u16()),
    }
}

/// Derive the user-facing message for a failing response.
///
/// A body that is not JSON is logged and degrades to [`status_message`].
pub fn api_error_message(status: StatusCode, body: &[u8]) -> String {
    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(status = status.as_u16(), error = %err, "Failed to parse error response body");
            None
        }
    };

    // Parsing succeeded, so the body is valid UTF-8
    let raw = std::str::from_utf8(body).unwrap_or_default();
    payload
        .as_ref()
        .and_then(|payload| ErrorPayload::classify(payload, raw))
        .map(ErrorPayload::into_message)
        .unwrap_or_else(|| status_message(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_validation_detail_wins() {
        let body = json!({
            "detail": [{ "loc": ["body", "text"], "msg": "field required" }],
            "message": "ignored"
        });
        assert_eq!(
            ErrorPayload::classify(&body, &body.to_string()),
            Some(ErrorPayload::Validation("field required".to_string()))
        );
    }

    #[test]
    fn test_message_field() {
        let body = json!({ "message": "Service overloaded" });
        assert_eq!(
            ErrorPayload::classify(&body, &body.to_string()),
            Some(ErrorPayload::Message("Service overloaded".to_string()))
        );
    }

    #[test]
    fn test_detail_string() {
        let body = json!({ "detail": "Invalid request" });
        assert_eq!(
            ErrorPayload::classify(&body, &body.to_string()),
            Some(ErrorPayload::Detail("Invalid request".to_string()))
        );
    }

    #[test]
    fn test_empty_validation_message_falls_through() {
        let body = json!({ "detail": [{ "msg": "" }], "message": "fallback" });
        assert_eq!(
            ErrorPayload::classify(&body, &body.to_string()),
            Some(ErrorPayload::Message("fallback".to_string()))
        );
    }

    #[test]
    fn test_unknown_shape_is_raw_json() {
        assert_eq!(
            api_error_message(StatusCode::BAD_REQUEST, br#"{"error":"boom"}"#),
            r#"{"error":"boom"}"#
        );
    }

    #[test]
    fn test_raw_body_keeps_key_order() {
        let body = r#"{"zeta":"first","alpha":"second"}"#;
        assert_eq!(
            api_error_message(StatusCode::BAD_REQUEST, format!("  {}\n", body).as_bytes()),
            body
        );
    }

    #[test]
    fn test_null_payload_has_no_message() {
        assert_eq!(ErrorPayload::classify(&Value::Null, "null"), None);
        assert_eq!(
            api_error_message(StatusCode::BAD_GATEWAY, b"null"),
            "Request failed with status 502: Bad Gateway"
        );
    }

    #[test]
    fn test_falsy_payloads_use_status() {
        for body in ["false", "0", "0.0", r#""""#] {
            assert_eq!(
                api_error_message(StatusCode::BAD_REQUEST, body.as_bytes()),
                "Request failed with status 400: Bad Request"
            );
        }
        assert_eq!(api_error_message(StatusCode::BAD_REQUEST, b"true"), "true");
    }

    #[test]
    fn test_non_json_body_uses_status() {
        assert_eq!(
            api_error_message(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>"),
            "Request failed with status 500: Internal Server Error"
        );
        assert_eq!(
            api_error_message(StatusCode::SERVICE_UNAVAILABLE, b""),
            "Request failed with status 503: Service Unavailable"
        );
    }

    #[test]
    fn test_status_without_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(status_message(status), "Request failed with status 599");
    }

    #[test]
    fn test_api_error_display_is_message() {
        let err = FittingError::Api {
            status: 400,
            message: "Invalid request".to_string(),
        };
        assert_eq!(err.message(), "Invalid request");
        assert_eq!(err.status(), Some(400));
    }
}
