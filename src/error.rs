use reqwest::StatusCode;

use crate::notice::Notice;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Request failed with status {status}")]
    Api {
        status: u16,
        detail: Option<String>,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Build an error from a non-success response status and the server's
    /// `detail` field, if it sent one.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ClientError::Unauthorized;
        }
        ClientError::Api {
            status: status.as_u16(),
            detail,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-supplied detail message when present, otherwise `fallback`.
    pub fn detail_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ClientError::Forbidden(msg) | ClientError::Invalid(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Log the failure and turn it into an error notice for the user.
    pub fn notice(&self, fallback: &str) -> Notice {
        match self {
            ClientError::Transport(e) => tracing::warn!("Transport error: {}", e),
            ClientError::Decode(e) => tracing::error!("Decode error: {}", e),
            ClientError::Storage(e) => tracing::error!("Storage error: {}", e),
            ClientError::Internal(e) => tracing::error!("Internal error: {}", e),
            other => tracing::warn!("{}", other),
        }
        Notice::error("Error", self.detail_or(fallback))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::Internal(format!("bad url: {}", e))
    }
}

impl From<crate::db::StoreError> for ClientError {
    fn from(e: crate::db::StoreError) -> Self {
        ClientError::Storage(e.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
