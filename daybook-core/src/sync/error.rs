//! Sync error types.

use thiserror::Error;

use crate::store::StorageError;

/// Coarse classification used by front ends to pick a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Credential,
    Transport,
    StorageUnavailable,
}

/// Errors that can occur during pull and push.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote document does not have the expected shape.
    #[error("Remote document has the wrong format: {0}")]
    Format(String),

    /// Push attempted without a token.
    #[error("A GitHub token is required to push")]
    Credential,

    /// Network failure or non-2xx response from the document store.
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    /// Local durable storage rejected an operation.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SyncError {
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format(reason.into())
    }

    /// Transport error for a response with an HTTP status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Transport error without a response (connection refused, DNS, ...).
    pub fn network(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format(_) => ErrorKind::Format,
            Self::Credential => ErrorKind::Credential,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Storage(_) => ErrorKind::StorageUnavailable,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::http(status.as_u16(), e.to_string()),
            None => Self::network(e.to_string()),
        }
    }
}
