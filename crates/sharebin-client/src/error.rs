use reqwest::StatusCode;
use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status and an `{"error"}` body.
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("you must be logged in")]
    NotAuthenticated,

    #[error("you are not authorized to {0}")]
    NotPermitted(&'static str),

    #[error("room '{0}' already exists")]
    RoomExists(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}
