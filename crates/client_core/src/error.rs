use thiserror::Error;

/// Failure of a single backend call, as seen by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend rejected request with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// Message supplied by the backend itself, if it sent one with the rejection.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Rejected {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        BackendError::InvalidUrl(err.to_string())
    }
}
