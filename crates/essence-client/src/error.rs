//! Client error types.

use essence_core::model::RequestShapeError;

/// Message shown when the service fails without a usable `detail`.
pub const GENERIC_SERVICE_MESSAGE: &str = "The calculation service could not process the request.";

/// Message shown when the service cannot be reached at all.
pub const GENERIC_TRANSPORT_MESSAGE: &str =
    "Could not reach the calculation service. Check the service URL and your connection.";

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Errors that can occur while talking to the dose-calculation service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("service returned HTTP {status}{}", detail_suffix(.detail))]
    Service {
        /// HTTP status code.
        status: u16,
        /// Human-readable message extracted from the response body.
        detail: Option<String>,
    },

    /// The request never produced a response (DNS, refused connection, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// A success response whose body did not match the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request was not sent because it does not carry exactly one product.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestShapeError),
}

impl ClientError {
    /// The message to present to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Service {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Service { detail: None, .. } | Self::MalformedResponse(_) => {
                GENERIC_SERVICE_MESSAGE.to_string()
            }
            Self::Transport(_) => GENERIC_TRANSPORT_MESSAGE.to_string(),
            Self::InvalidRequest(err) => err.to_string(),
        }
    }

    /// Returns `true` for failures where the service was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Extracts the `detail` message from an error body.
///
/// A string `detail` is used as is. A list of validation objects (each with a
/// `msg`) is joined with `"; "`. Anything else yields `None`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detail_string_is_extracted() {
        assert_eq!(
            extract_detail(r#"{"detail": "Body weight out of range"}"#).as_deref(),
            Some("Body weight out of range")
        );
    }

    #[test]
    fn detail_list_is_joined() {
        let body = r#"{"detail": [{"loc": ["body"], "msg": "field required"}, {"msg": "bad route"}]}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("field required; bad route"));
    }

    #[test]
    fn missing_or_unusable_detail_is_none() {
        assert_eq!(extract_detail(r#"{"error": "x"}"#), None);
        assert_eq!(extract_detail(r#"{"detail": 42}"#), None);
        assert_eq!(extract_detail(r#"{"detail": "  "}"#), None);
        assert_eq!(extract_detail("<html>502</html>"), None);
    }

    #[test]
    fn user_message_falls_back_to_generic_text() {
        let with_detail = ClientError::Service {
            status: 400,
            detail: Some("Formula total is 90%".into()),
        };
        assert_eq!(with_detail.user_message(), "Formula total is 90%");
        assert_eq!(with_detail.to_string(), "service returned HTTP 400: Formula total is 90%");

        let bare = ClientError::Service { status: 500, detail: None };
        assert_eq!(bare.user_message(), GENERIC_SERVICE_MESSAGE);
        assert_eq!(bare.to_string(), "service returned HTTP 500");

        let transport = ClientError::Transport("connection refused".into());
        assert_eq!(transport.user_message(), GENERIC_TRANSPORT_MESSAGE);
        assert!(transport.is_transport());
    }
}
