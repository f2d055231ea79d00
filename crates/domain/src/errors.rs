//! Error types used throughout the client
//!
//! Every failed operation surfaces as a single [`AuraError`]. Errors that stem
//! from an HTTP response keep the `X-Request-Id` correlation id and the raw
//! body so they can be handed to Neo4j support.

use std::time::Duration;

use thiserror::Error;

use crate::constants::is_retryable_status;

/// Categories of client errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Token endpoint rejected the credentials or returned garbage
    Authentication,
    /// Connection/timeout failures before a response arrived
    Network,
    /// 5xx responses
    Server,
    /// 4xx responses
    Client,
    /// 2xx responses whose body did not match the expected shape
    Decode,
    /// Caller cancelled the call
    Cancelled,
    /// Invalid construction or settings
    Config,
}

/// Failure to project a successful response body into a typed result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(r#"expected response to contain key "data""#)]
    MissingEnvelope,

    #[error(r#"response missing key "{0}""#)]
    MissingField(String),

    #[error(r#"response key "{field}" is not a {expected}"#)]
    MismatchedField { field: String, expected: &'static str },

    #[error("malformed response body: {0}")]
    Malformed(String),
}

impl DecodeError {
    /// Name of the offending key, when the error is about a single field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField(field) | Self::MismatchedField { field, .. } => Some(field),
            Self::MissingEnvelope | Self::Malformed(_) => None,
        }
    }
}

/// Main error type for the Aura client
#[derive(Debug, Error)]
pub enum AuraError {
    #[error("Aura authentication failed with status {status}: {message}")]
    Auth { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error(
        "Aura API error: status {status}, gave up after {attempts} attempts\n\
         Aura request ID: {request_id}\nResponse body: {body}"
    )]
    RetryExhausted { attempts: u32, status: u16, body: String, request_id: String },

    #[error("Aura API error: status {status}\nAura request ID: {request_id}\nResponse body: {body}")]
    Api { status: u16, body: String, request_id: String },

    #[error("Aura API error: {source}\nAura request ID: {request_id}\nResponse body: {body}")]
    Decode {
        #[source]
        source: DecodeError,
        body: String,
        request_id: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuraError {
    /// Get the error category for this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Auth { .. } => ErrorCategory::Authentication,
            Self::Transport(_) | Self::Timeout(_) => ErrorCategory::Network,
            Self::RetryExhausted { .. } => ErrorCategory::Server,
            Self::Api { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Api { .. } => ErrorCategory::Client,
            Self::Decode { .. } => ErrorCategory::Decode,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether repeating the whole operation later could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) | Self::RetryExhausted { .. } => true,
            Self::Api { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Correlation id reported by the server, if the response carried one.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::RetryExhausted { request_id, .. }
            | Self::Api { request_id, .. }
            | Self::Decode { request_id, .. } => {
                Some(request_id.as_str()).filter(|id| !id.is_empty())
            }
            _ => None,
        }
    }

    /// HTTP status of the response behind this error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. }
            | Self::RetryExhausted { status, .. }
            | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body behind this error.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::RetryExhausted { body, .. } | Self::Api { body, .. } | Self::Decode { body, .. } => {
                Some(body.as_str())
            }
            _ => None,
        }
    }

    /// The decode failure, for errors raised while projecting a 2xx body.
    #[must_use]
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for Aura client operations
pub type Result<T> = std::result::Result<T, AuraError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> AuraError {
        AuraError::Api { status, body: "boom".into(), request_id: "track-me-123".into() }
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            AuraError::Auth { status: 401, message: "nope".into() }.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(AuraError::Transport("refused".into()).category(), ErrorCategory::Network);
        assert_eq!(api(503).category(), ErrorCategory::Server);
        assert_eq!(api(410).category(), ErrorCategory::Client);
        assert_eq!(AuraError::Cancelled.category(), ErrorCategory::Cancelled);
    }

    #[test]
    fn test_is_retryable() {
        assert!(api(502).is_retryable());
        assert!(!api(501).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(AuraError::Transport("reset".into()).is_retryable());
        assert!(!AuraError::Auth { status: 400, message: String::new() }.is_retryable());
    }

    #[test]
    fn test_display_includes_request_id_and_body() {
        let message = api(500).to_string();
        assert!(message.contains("track-me-123"));
        assert!(message.contains("boom"));
        assert!(message.contains("500"));
    }

    #[test]
    fn test_empty_request_id_is_none() {
        let err = AuraError::Api { status: 500, body: String::new(), request_id: String::new() };
        assert_eq!(err.request_id(), None);
        assert_eq!(api(500).request_id(), Some("track-me-123"));
    }

    #[test]
    fn test_decode_error_names_field() {
        let err = AuraError::Decode {
            source: DecodeError::MissingField("status".into()),
            body: "{}".into(),
            request_id: String::new(),
        };
        assert_eq!(err.decode_error().and_then(DecodeError::field), Some("status"));
        assert!(err.to_string().contains(r#""status""#));
    }
}
