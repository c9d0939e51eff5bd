//! Interpreter backed by a language model

use crate::prompt::{build_system_prompt, FEW_SHOT};
use crate::{
    Displacement, InterpretError, Interpretation, Interpreter, InterpreterConfig, Lexicon,
    Result, Utterance,
};
use async_trait::async_trait;
use llm_backend::{ChatMessage, CompletionBackend, CompletionRequest};

/// Sends the instruction, the worked examples and the live utterance to a
/// completion backend and parses the reply grammar
pub struct LlmInterpreter<B> {
    backend: B,
    config: InterpreterConfig,
    system_prompt: String,
}

impl<B: CompletionBackend> LlmInterpreter<B> {
    pub fn new(backend: B, config: InterpreterConfig, lexicon: &Lexicon) -> Self {
        Self {
            backend,
            config,
            system_prompt: build_system_prompt(lexicon),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn build_request(&self, utterance: &Utterance) -> CompletionRequest {
        let mut messages = Vec::with_capacity(2 + FEW_SHOT.len() * 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        for example in FEW_SHOT {
            messages.push(ChatMessage::user(example.utterance));
            messages.push(ChatMessage::assistant(example.reply()));
        }
        messages.push(ChatMessage::user(utterance.as_str()));

        CompletionRequest {
            model: self.config.model.clone(),
            temperature: Some(self.config.temperature),
            messages,
        }
    }
}

#[async_trait]
impl<B: CompletionBackend> Interpreter for LlmInterpreter<B> {
    async fn interpret(&self, utterance: &Utterance) -> Result<Interpretation> {
        if utterance.is_blank() {
            return Err(InterpretError::UnrecognizedInput(
                "empty utterance".to_string(),
            ));
        }

        let completion = self
            .backend
            .complete(self.build_request(utterance))
            .await
            .map_err(InterpretError::from)?;

        let displacement = Displacement::parse_reply(&completion.text).map_err(|e| {
            tracing::warn!(
                "Backend reply for {:?} is outside the grammar: {:?}",
                utterance.as_str(),
                completion.text
            );
            e
        })?;
        tracing::debug!("{:?} -> {}", utterance.as_str(), displacement);

        Ok(Interpretation {
            displacement,
            reply: Some(completion.text),
            usage: completion.usage,
        })
    }

    fn name(&self) -> &str {
        "llm"
    }
}
