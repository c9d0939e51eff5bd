use llm_backend::BackendError;
use thiserror::Error;

pub type Result<T, E = InterpretError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum InterpretError {
    /// Input could not be transcribed or the reply did not match the grammar
    #[error("unrecognized input: {0}")]
    UnrecognizedInput(String),
    /// The language-understanding call failed at the transport level
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("invalid lexicon entry {phrase:?}: {reason}")]
    Lexicon { phrase: String, reason: String },
    #[error("lexicon file error: {0}")]
    LexiconFile(String),
}

impl From<BackendError> for InterpretError {
    fn from(err: BackendError) -> Self {
        if err.is_transport() {
            InterpretError::BackendUnavailable(err.to_string())
        } else {
            // Timeouts and unreadable bodies leave nothing to interpret
            InterpretError::UnrecognizedInput(err.to_string())
        }
    }
}

impl InterpretError {
    /// Whether a fresh utterance may succeed where this one failed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InterpretError::UnrecognizedInput(_))
    }
}
