use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("User cancelled the request")]
    UserCancelled,

    #[error("No internet connection")]
    NetworkUnavailable,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid settings: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl AppError {
    /// Cancellation is a controlled stop, never something to alert about.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AppError::UserCancelled)
    }
}

pub type AppResult<T> = Result<T, AppError>;
