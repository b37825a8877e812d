//! Client-side API error.
//!
//! Every failed call resolves to one [`ApiError`] whose `Display` is the
//! message shown to the user. The message for a non-2xx response is taken,
//! in order, from the JSON body's `message`, `msg` or `error` field, then the
//! raw body text, then a generic status line. When the text came from a
//! `message` or `msg` field it is also kept as the server's own message,
//! which forms show in place of their default wording.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response was received.
    #[error("{0}")]
    Network(String),

    /// 401, or a mutating call attempted without a session.
    #[error("{message}")]
    Unauthorized {
        message: String,
        server_message: Option<String>,
    },

    /// Any other non-2xx response.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        server_message: Option<String>,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Build an error from a non-2xx response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = error_message(status, body);
        let server_message = server_message(body);
        if status == 401 {
            ApiError::Unauthorized {
                message,
                server_message,
            }
        } else {
            ApiError::Http {
                status,
                message,
                server_message,
            }
        }
    }

    /// Error for a mutating call attempted while signed out.
    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized {
            message: "Authentication required".to_string(),
            server_message: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The `message` or `msg` field of the response body, if it had one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { server_message, .. }
            | ApiError::Http { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }
}

fn body_field(body: &str, keys: &[&str]) -> Option<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return None;
    };
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// The server's own explanation: a non-blank `message` or `msg` field.
pub fn server_message(body: &str) -> Option<String> {
    body_field(body, &["message", "msg"])
}

/// Derive the user-facing message for a failed response body.
pub fn error_message(status: u16, body: &str) -> String {
    if let Some(text) = body_field(body, &["message", "msg", "error"]) {
        return text;
    }

    let text = body.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    format!("HTTP error! status: {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_wins() {
        let err = ApiError::from_response(400, r#"{"message":"X","msg":"other"}"#);
        assert_eq!(err.to_string(), "X");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_msg_and_error_fallbacks() {
        assert_eq!(error_message(400, r#"{"msg":"Bad credentials"}"#), "Bad credentials");
        assert_eq!(error_message(500, r#"{"error":"boom"}"#), "boom");
    }

    #[test]
    fn test_non_json_body_is_used_verbatim() {
        let err = ApiError::from_response(502, "Y");
        assert_eq!(err.to_string(), "Y");
    }

    #[test]
    fn test_json_without_message_falls_back_to_text() {
        assert_eq!(error_message(409, r#"{"code":11000}"#), r#"{"code":11000}"#);
    }

    #[test]
    fn test_server_message_only_from_message_fields() {
        let err = ApiError::from_response(400, r#"{"msg":"Bad credentials"}"#);
        assert_eq!(err.server_message(), Some("Bad credentials"));

        let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "<html>Bad Gateway</html>");
        assert_eq!(err.server_message(), None);

        let err = ApiError::from_response(500, r#"{"error":"boom"}"#);
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.server_message(), None);

        assert_eq!(ApiError::not_authenticated().server_message(), None);
    }

    #[test]
    fn test_empty_body_gets_generic_message() {
        assert_eq!(error_message(503, ""), "HTTP error! status: 503");
        assert_eq!(error_message(500, "   "), "HTTP error! status: 500");
    }

    #[test]
    fn test_unauthorized_is_distinguished() {
        let err = ApiError::from_response(401, r#"{"msg":"Token is not valid"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Token is not valid");
        assert_eq!(err.status(), Some(401));

        assert!(!ApiError::from_response(403, "").is_unauthorized());
        assert!(ApiError::not_authenticated().is_unauthorized());
    }
}
