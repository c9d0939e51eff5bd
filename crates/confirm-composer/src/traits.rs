use crate::{Confirmation, Result};
use async_trait::async_trait;
use intent_parser::{Displacement, Utterance};
use std::sync::Arc;

/// Phrases the read-back an operator hears before anything moves
#[async_trait]
pub trait Composer: Send + Sync {
    async fn compose(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
    ) -> Result<Confirmation>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<C: Composer + ?Sized> Composer for Arc<C> {
    async fn compose(
        &self,
        utterance: &Utterance,
        displacement: &Displacement,
    ) -> Result<Confirmation> {
        (**self).compose(utterance, displacement).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
