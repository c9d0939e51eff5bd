use crate::{Interpretation, Result, Utterance};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns an operator utterance into a displacement
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, utterance: &Utterance) -> Result<Interpretation>;

    /// Short name for logs and reports
    fn name(&self) -> &str;
}

#[async_trait]
impl<I: Interpreter + ?Sized> Interpreter for Arc<I> {
    async fn interpret(&self, utterance: &Utterance) -> Result<Interpretation> {
        (**self).interpret(utterance).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
