//! Client error types.

use thiserror::Error;

/// Client error type.
///
/// Every operation reports exactly one of these. Nothing is retried inside the client.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing. No request was sent.
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    /// HTTP request failed at the transport level.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response envelope reported a platform error.
    #[error("API error (code {code}): {msg}")]
    Api {
        /// Numeric error code from the envelope (`code` or `error_code`).
        code: i64,
        /// Message from the envelope (`msg` or `error_message`).
        msg: String,
        /// Value of the `x-tt-logid` response header.
        logid: Option<String>,
    },

    /// The response body could not be decoded.
    #[error("Malformed response: {source}")]
    MalformedResponse {
        /// Value of the `x-tt-logid` response header.
        logid: Option<String>,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A streaming call was cancelled through its token.
    #[error("Stream cancelled")]
    Cancelled,

    /// The chat polling helper gave up before the chat reached a terminal state.
    #[error("Chat {chat_id} still {status} after {attempts} polls")]
    PollExhausted {
        /// Chat being polled.
        chat_id: String,
        /// Number of retrieve calls made.
        attempts: u32,
        /// Last observed status.
        status: String,
    },
}

impl Error {
    /// Shorthand for a missing required field.
    pub(crate) fn missing(field: &str) -> Self {
        Error::InvalidParam(format!("{field} is required"))
    }

    /// Check if this error was raised before any request was sent.
    pub fn is_invalid_param(&self) -> bool {
        matches!(self, Error::InvalidParam(_))
    }

    /// Check if this is a transport-level failure.
    pub fn is_network_error(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Transport(_))
    }

    /// Check if the server answered but the answer signals failure.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api { .. } | Error::MalformedResponse { .. })
    }

    /// Platform error code, if this is an API error.
    pub fn code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Log id of the failed response, if one was captured.
    pub fn logid(&self) -> Option<&str> {
        match self {
            Error::Api { logid, .. } | Error::MalformedResponse { logid, .. } => logid.as_deref(),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_accessors() {
        let err = Error::Api {
            code: 4000,
            msg: "bad request".to_string(),
            logid: Some("2024abc".to_string()),
        };
        assert!(err.is_api_error());
        assert!(!err.is_network_error());
        assert_eq!(err.code(), Some(4000));
        assert_eq!(err.logid(), Some("2024abc"));
        assert_eq!(err.to_string(), "API error (code 4000): bad request");
    }

    #[test]
    fn test_malformed_response_is_api_error() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = Error::MalformedResponse {
            logid: None,
            source,
        };
        assert!(err.is_api_error());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_missing_field() {
        let err = Error::missing("chat_id");
        assert!(err.is_invalid_param());
        assert_eq!(err.to_string(), "Invalid parameter: chat_id is required");
    }
}
