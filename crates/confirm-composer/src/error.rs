use intent_parser::{Axis, Sign};
use llm_backend::BackendError;
use thiserror::Error;

pub type Result<T, E = ComposeError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl From<BackendError> for ComposeError {
    fn from(err: BackendError) -> Self {
        ComposeError::BackendUnavailable(err.to_string())
    }
}

/// Ways a confirmation can fail its contract
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("text does not repeat the utterance")]
    MissingEcho,
    #[error("text does not name the {0}")]
    MissingAxis(Axis),
    #[error("text does not move the {axis} in the {} direction", .expected.label())]
    WrongDirection { axis: Axis, expected: Sign },
    #[error("text does not state {expected} mm for the {axis}")]
    MissingMagnitude { axis: Axis, expected: String },
    #[error("text does not end with a question")]
    MissingQuestion,
}
