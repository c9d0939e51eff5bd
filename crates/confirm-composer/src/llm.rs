//! Confirmation phrased by a language model, checked before use

use crate::{
    Composer, ComposeError, ComposerConfig, Confirmation, ConfirmationText, Result,
    TemplateComposer,
};
use async_trait::async_trait;
use intent_parser::{Displacement, Utterance};
use llm_backend::{ChatMessage, CompletionBackend, CompletionRequest, TokenUsage};

const SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Always start your answer by repeating the prompt by replying 'I heard you said ...'. \
Then, say 'I will ...' following a natural language description of the prompt_exe, \
where the unit is always in millimeters. \
Always finish with a question for confirmation.";

/// Worked examples: utterance, displacement, confirmation
const FEW_SHOT: [(&str, [f64; 3], &str); 2] = [
    (
        "Shift along x-axis for 0.5 m",
        [500.0, 0.0, 0.0],
        "I heard you said shift along x-axis for 0.5 m. I will move along positive x-axis \
         for 500 mm. Does that sound good to you?",
    ),
    (
        "move towards me a little bit, move to the left for 6 cm, and lower for 12 mm",
        [-60.0, -1.0, -12.0],
        "I heard you said move towards me a little bit, move to the left for 6 cm, and lower \
         for 12 mm. I will move along negative x-axis for 60 mm, negative y-axis for 1 mm, \
         and negative z-axis for 12 mm. Is that OK?",
    ),
];

fn user_turn(utterance: &str, displacement: &Displacement) -> String {
    format!("prompt: {}; prompt_exe: {}", utterance, displacement)
}

/// Asks a completion backend for the confirmation wording
///
/// Replies that drop the echo, a moving axis, its direction or magnitude, or
/// the closing question are replaced with the template rendering. A backend that cannot
/// be reached at all is an error; a backend that answers badly is not.
pub struct LlmComposer<B> {
    backend: B,
    config: ComposerConfig,
    fallback: TemplateComposer,
}

impl<B: CompletionBackend> LlmComposer<B> {
    pub fn new(backend: B, config: ComposerConfig) -> Self {
        Self {
            backend,
            config,
            fallback: TemplateComposer::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn build_request(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
    ) -> CompletionRequest {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        for (example, [x, y, z], reply) in FEW_SHOT {
            messages.push(ChatMessage::user(user_turn(
                example,
                &Displacement::new(x, y, z),
            )));
            messages.push(ChatMessage::assistant(reply));
        }
        messages.push(ChatMessage::user(user_turn(
            utterance.as_str(),
            displacement,
        )));

        CompletionRequest {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            messages,
        }
    }

    fn fall_back(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
        usage: TokenUsage,
    ) -> Confirmation {
        Confirmation {
            text: self.fallback.render(utterance, displacement),
            usage,
            fell_back: true,
        }
    }
}

#[async_trait]
impl<B: CompletionBackend> Composer for LlmComposer<B> {
    async fn compose(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
    ) -> Result<Confirmation> {
        let request = self.build_request(utterance, displacement);
        let completion = match self.backend.complete(request).await {
            Ok(completion) => completion,
            Err(e) if e.is_transport() => return Err(ComposeError::from(e)),
            Err(e) => {
                tracing::warn!("Confirmation backend failed ({}), using template", e);
                return Ok(self.fall_back(utterance, displacement, TokenUsage::default()));
            }
        };

        let text = ConfirmationText::new(completion.text.trim());
        match text.check(utterance, displacement) {
            Ok(()) => {
                tracing::debug!("Confirmation: {}", text);
                Ok(Confirmation {
                    text,
                    usage: completion.usage,
                    fell_back: false,
                })
            }
            Err(violation) => {
                tracing::warn!(
                    "Confirmation reply rejected ({}): {:?}, using template",
                    violation,
                    completion.text
                );
                Ok(self.fall_back(utterance, displacement, completion.usage))
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}
