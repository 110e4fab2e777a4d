//! Custom error types for the admin client

use common::error::{SessionError, StoreError};
use serde_json::Value;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Error raised by a single request to the backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response
    #[error("Could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server refused the request
    #[error("Server returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// The server rejected the session (401/403)
    #[error("Session rejected by the server, please log in again")]
    Unauthorized { status: u16, message: Option<String> },

    /// A 2xx body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A 2xx body was valid JSON but lacked a required field
    #[error("Unexpected server response")]
    UnexpectedResponse,
}

impl ClientError {
    /// Message sent by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } | ClientError::Unauthorized { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    /// Whether the server refused the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }
}

/// Extract the server's message from an error body
///
/// Accepts `{"message": "..."}`, `{"message": ["...", "..."]}` and
/// `{"error": "..."}`.
pub(crate) fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    match value.get("message") {
        Some(Value::String(message)) if !message.is_empty() => return Some(message.clone()),
        Some(Value::Array(messages)) => {
            let joined = messages
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return Some(joined);
            }
        }
        _ => {}
    }

    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|error| !error.is_empty())
        .map(str::to_string)
}

/// Type alias for client results
pub type ClientResult<T> = Result<T, ClientError>;

/// Error raised by a resource controller operation
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Local validation refused the input; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Another submission is still in flight
    #[error("A request is already in progress")]
    Busy,

    /// The operation does not apply to the current dialog state
    #[error("{0}")]
    InvalidState(&'static str),

    /// The controller was torn down before the response arrived
    #[error("Request cancelled")]
    Cancelled,

    /// The session guard refused the stored session
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The request failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ControllerError {
    /// The message shown to the user, preferring the server's own
    /// explanation when `prefer_server` is set
    pub fn user_message(&self, fallback: &str, prefer_server: bool) -> String {
        match self {
            ControllerError::Validation(errors) => errors.to_string(),
            ControllerError::Session(e) => e.to_string(),
            ControllerError::Client(e) if e.is_unauthorized() => e.to_string(),
            ControllerError::Client(e) if prefer_server => e
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            _ => fallback.to_string(),
        }
    }
}

/// Type alias for controller results
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Error raised by login, registration and profile flows
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_shapes() {
        assert_eq!(
            server_message(br#"{"message":"Club already exists"}"#).as_deref(),
            Some("Club already exists")
        );
        assert_eq!(
            server_message(br#"{"message":["email must be an email","name should not be empty"],"statusCode":400}"#)
                .as_deref(),
            Some("email must be an email; name should not be empty")
        );
        assert_eq!(
            server_message(br#"{"error":"Unauthorized"}"#).as_deref(),
            Some("Unauthorized")
        );
        assert_eq!(server_message(b"<html>Bad Gateway</html>"), None);
        assert_eq!(server_message(b""), None);
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ControllerError::Client(ClientError::Status {
            status: 409,
            message: Some("Name taken".to_string()),
        });
        assert_eq!(err.user_message("Could not create club", true), "Name taken");
        assert_eq!(
            err.user_message("Could not delete club", false),
            "Could not delete club"
        );

        let silent = ControllerError::Client(ClientError::Status {
            status: 500,
            message: None,
        });
        assert_eq!(
            silent.user_message("Could not create club", true),
            "Could not create club"
        );
    }
}
