//! Error types for the AMI client

use crate::message::AmiMessage;
use thiserror::Error;

/// Errors produced by the AMI client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AmiError {
    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection went away before the action was answered.
    #[error("connection closed")]
    ConnectionClosed,

    /// An action was dispatched while no connection exists.
    #[error("not connected")]
    NotConnected,

    /// A connect attempt did not complete in time.
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Malformed data on the wire, or an action that cannot be serialized.
    #[error("protocol error: {message}")]
    ProtocolError { message: String },

    /// The server answered an action with `Response: Error`.
    #[error("action failed: {message}")]
    ActionFailed {
        message: String,
        response: AmiMessage,
    },

    /// Login was rejected.
    #[error("authentication failed: {reason}")]
    AuthFailed { reason: String },

    /// A dynamic payload could not be turned into an action.
    #[error("invalid action: {0}")]
    InvalidAction(String),
}

impl AmiError {
    pub(crate) fn protocol_error(message: impl Into<String>) -> Self {
        AmiError::ProtocolError {
            message: message.into(),
        }
    }

    pub(crate) fn auth_failed(reason: impl Into<String>) -> Self {
        AmiError::AuthFailed {
            reason: reason.into(),
        }
    }

    /// Build the error delivered for a `Response: Error` reply.
    pub(crate) fn action_failed(response: AmiMessage) -> Self {
        let message = response
            .message()
            .unwrap_or("Error")
            .to_string();
        AmiError::ActionFailed { message, response }
    }

    /// `true` for errors meaning the transport is gone.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            AmiError::Io(_) | AmiError::ConnectionClosed | AmiError::NotConnected
        )
    }
}

/// Result type alias using [`AmiError`].
pub type AmiResult<T> = Result<T, AmiError>;
