//! Intent Parser for movement commands
//!
//! Converts an operator's natural-language instruction ("lower down for 70
//! centimeters and move to the left for 3 millimeters") into a Cartesian
//! displacement in millimeters. Two interpreters share one vocabulary: a
//! deterministic rule interpreter driven by the [`Lexicon`] tables, and a
//! language-model interpreter that sends an instruction plus worked examples
//! to a [`llm_backend::CompletionBackend`] and parses the reply grammar.

mod error;
mod grammar;
mod lexicon;
mod llm;
pub mod prompt;
mod rules;
mod traits;
mod types;
mod units;

pub use error::{InterpretError, Result};
pub use grammar::{format_magnitude, format_mm};
pub use lexicon::{
    Cue, CueMatch, DirectionCue, Lexicon, LexiconExtension, LexiconMatcher, MarkerCue,
    NumberWord, UnitAlias,
};
pub use llm::LlmInterpreter;
pub use rules::{RuleInterpreter, SMALL_MOTION_MM};
pub use traits::Interpreter;
pub use types::{Axis, Displacement, Interpretation, Sign, Utterance};
pub use units::UnitToken;

use serde::{Deserialize, Serialize};

/// Configuration for model-backed interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Model identifier sent with every request
    pub model: String,
    /// Sampling temperature; 0 keeps the reply deterministic
    pub temperature: f32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
        }
    }
}

/// Initialize the intent parser system
pub fn init() -> Result<()> {
    tracing::info!("Initializing Intent Parser system");
    Ok(())
}

/// Create a rule interpreter with the built-in vocabulary
pub fn create_interpreter() -> Result<RuleInterpreter> {
    RuleInterpreter::new(&Lexicon::default())
}

/// Interpret a command with the built-in vocabulary, no backend involved
pub fn interpret_command(text: &str) -> Result<Displacement> {
    let interpreter = create_interpreter()?;
    if text.trim().is_empty() {
        return Err(InterpretError::UnrecognizedInput(
            "empty utterance".to_string(),
        ));
    }
    Ok(interpreter.resolve(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_commands() {
        let test_cases = vec![
            ("raise arm 15 cm", Displacement::new(0.0, 0.0, 150.0)),
            ("lower the arm by 10 centimeters", Displacement::new(0.0, 0.0, -100.0)),
            ("move arm up 20 cm", Displacement::new(0.0, 0.0, 200.0)),
            ("extend arm forward 30 cm", Displacement::new(0.0, -300.0, 0.0)),
            ("stop the arm", Displacement::ZERO),
        ];

        for (command, expected) in test_cases {
            let got = interpret_command(command).unwrap();
            assert!(got.approx_eq(&expected, 1e-9), "{command:?} -> {got}");
        }
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            interpret_command(""),
            Err(InterpretError::UnrecognizedInput(_))
        ));
    }
}
