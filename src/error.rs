use std::fmt;

use serde::Deserialize;
use thiserror::Error;

const FORBIDDEN_MESSAGE: &str = "Access forbidden. Please check your credentials or contact support.";
const EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
const NETWORK_MESSAGE: &str = "Something went wrong. Check your connection and try again.";

/// The `error`/`message` fields the Vault API puts in non-2xx bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.error.as_deref().or(self.message.as_deref()).unwrap_or("no details");
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("unauthorized (HTTP 401)")]
    Unauthorized,

    #[error("forbidden (HTTP 403): {0}")]
    Forbidden(ErrorBody),

    #[error("request rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: ErrorBody },

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("request cancelled because the session ended while it was in flight")]
    Cancelled,

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("could not read local file: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Forbidden(body) | Self::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Store-facing message: the body's `error` field, else `default`.
    pub fn message_or(&self, default: &str) -> String {
        if let Self::Validation(msg) = self {
            return msg.clone();
        }
        self.body().and_then(|b| b.error.clone()).unwrap_or_else(|| default.to_string())
    }

    /// Inline text shown to the user for this error class.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Unauthorized => EXPIRED_MESSAGE.to_string(),
            Self::Forbidden(_) => FORBIDDEN_MESSAGE.to_string(),
            Self::Rejected { body, .. } => body
                .error
                .clone()
                .or_else(|| body.message.clone())
                .unwrap_or_else(|| "Something went wrong".to_string()),
            Self::Transport(_) | Self::Decode(_) => NETWORK_MESSAGE.to_string(),
            Self::Cancelled | Self::Storage(_) | Self::Io(_) => self.to_string(),
        }
    }
}
