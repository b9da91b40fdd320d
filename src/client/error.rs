use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Server-side failure reported with a status code.
    #[error("server error: {0}")]
    Transient(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("snapshot storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("invalid snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a non-success response onto the error taxonomy. `message` is the
    /// `message` field of the server's error body, when there was one.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            s if s.is_client_error() => ClientError::InvalidArgument(message),
            _ => ClientError::Transient(message),
        }
    }

    /// Text reported by the server, suitable for showing to the user.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized(m)
            | ClientError::NotFound(m)
            | ClientError::InvalidArgument(m)
            | ClientError::Transient(m) => Some(m),
            ClientError::Network(_) | ClientError::Storage(_) | ClientError::Serialization(_) => {
                None
            }
        }
    }
}
