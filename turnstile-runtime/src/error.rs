use tokio::sync::{mpsc, oneshot};
use turnstile_core::TurnError;

/// Runtime errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RuntimeError {
    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),

    #[error("Session runtime closed")]
    Closed,
}

impl<T> From<mpsc::error::SendError<T>> for RuntimeError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        RuntimeError::Closed
    }
}

impl From<oneshot::error::RecvError> for RuntimeError {
    fn from(_: oneshot::error::RecvError) -> Self {
        RuntimeError::Closed
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
