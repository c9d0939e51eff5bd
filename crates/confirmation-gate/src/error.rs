use crate::{GateEvent, GateState};
use confirm_composer::ComposeError;
use intent_parser::InterpretError;
use thiserror::Error;

pub type Result<T, E = GateError> = core::result::Result<T, E>;

/// Failures that end a session without a decision
#[derive(Debug, Error)]
pub enum GateError {
    #[error("interpretation failed: {0}")]
    Interpret(#[from] InterpretError),
    #[error("composition failed: {0}")]
    Compose(#[from] ComposeError),
    #[error("operator channel error: {0}")]
    Channel(String),
    #[error("operator channel closed")]
    ChannelClosed,
    #[error("actuator error: {0}")]
    Actuator(String),
    #[error("no transition from {from:?} on {event:?}")]
    InvalidTransition { from: GateState, event: GateEvent },
    #[error("invalid gate policy: {0}")]
    InvalidPolicy(String),
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::Channel(err.to_string())
    }
}
