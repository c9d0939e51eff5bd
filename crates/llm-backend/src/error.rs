use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = BackendError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure: network, auth, rate limit, non-success status
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),
    /// The call succeeded but the body could not be read as a completion
    #[error("malformed backend response: {0}")]
    Response(String),
    #[error("unsupported backend type: {0}")]
    Unsupported(String),
    #[error("scripted backend has no replies left")]
    Exhausted,
}

impl BackendError {
    /// Whether the failure happened at the transport level
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BackendError::Unavailable(_) | BackendError::Unsupported(_) | BackendError::Exhausted
        )
    }
}
