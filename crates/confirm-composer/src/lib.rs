//! Confirmation Composer
//!
//! Before a displacement is executed the operator hears it read back: the
//! utterance repeated ("I heard you said ..."), the motion restated per axis in
//! millimeters ("I will move along positive x-axis for 500 mm"), and a closing
//! question. [`TemplateComposer`] renders that deterministically;
//! [`LlmComposer`] lets a language model phrase it and checks the reply with
//! [`ConfirmationText::check`] before trusting it.

mod error;
mod llm;
mod template;
mod text;
mod traits;

pub use error::{ComposeError, ContractViolation, Result};
pub use llm::LlmComposer;
pub use template::{TemplateComposer, MOVE_QUESTION, STAY_QUESTION};
pub use text::ConfirmationText;
pub use traits::Composer;

use llm_backend::TokenUsage;
use serde::{Deserialize, Serialize};

/// A composed confirmation and what it cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    pub text: ConfirmationText,
    pub usage: TokenUsage,
    /// The backend reply was unusable and the template was spoken instead
    pub fell_back: bool,
}

impl Confirmation {
    pub fn local(text: ConfirmationText) -> Self {
        Self {
            text,
            usage: TokenUsage::default(),
            fell_back: false,
        }
    }
}

/// Configuration for model-backed composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    pub model: String,
    /// `None` keeps the provider's default sampling, which gives the
    /// confirmations some variety
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: None,
        }
    }
}

/// Initialize the confirmation composer
pub fn init() -> Result<()> {
    tracing::info!("Initializing Confirmation Composer");
    Ok(())
}
