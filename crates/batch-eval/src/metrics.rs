use crate::{BatchError, Result};
use llm_backend::TokenUsage;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

#[derive(Clone)]
pub struct UsageCounters {
    pub prompt_tokens: IntCounter,
    pub completion_tokens: IntCounter,
    pub total_tokens: IntCounter,
    pub items_processed: IntCounter,
    pub item_failures: IntCounter,
}

/// Token and item counters for batch runs
#[derive(Clone)]
pub struct UsageMetrics {
    pub registry: Registry,
    pub usage: UsageCounters,
}

fn counter(name: &str, help: &str) -> Result<IntCounter> {
    IntCounter::new(name, help).map_err(|e| BatchError::Metrics(format!("metrics init error: {e}")))
}

impl UsageMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let usage = UsageCounters {
            prompt_tokens: counter("hri_prompt_tokens", "Prompt tokens sent to the backend")?,
            completion_tokens: counter(
                "hri_completion_tokens",
                "Completion tokens returned by the backend",
            )?,
            total_tokens: counter("hri_total_tokens", "Total tokens billed by the backend")?,
            items_processed: counter("hri_items_processed", "Batch items processed")?,
            item_failures: counter("hri_item_failures", "Batch items that failed")?,
        };
        for c in [
            &usage.prompt_tokens,
            &usage.completion_tokens,
            &usage.total_tokens,
            &usage.items_processed,
            &usage.item_failures,
        ] {
            registry
                .register(Box::new(c.clone()))
                .map_err(|e| BatchError::Metrics(format!("metrics register error: {e}")))?;
        }
        Ok(Self { registry, usage })
    }

    pub fn record_usage(&self, usage: &TokenUsage) {
        self.usage.prompt_tokens.inc_by(usage.prompt_tokens);
        self.usage.completion_tokens.inc_by(usage.completion_tokens);
        self.usage.total_tokens.inc_by(usage.total_tokens);
    }

    pub fn record_item(&self, ok: bool) {
        self.usage.items_processed.inc();
        if !ok {
            self.usage.item_failures.inc();
        }
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_encode() {
        let metrics = UsageMetrics::new().unwrap();
        metrics.record_usage(&TokenUsage::new(100, 20));
        metrics.record_usage(&TokenUsage::new(50, 5));
        metrics.record_item(true);
        metrics.record_item(false);

        assert_eq!(metrics.usage.total_tokens.get(), 175);
        assert_eq!(metrics.usage.item_failures.get(), 1);

        let text = metrics.encode_text();
        assert!(text.contains("hri_prompt_tokens 150"));
        assert!(text.contains("hri_items_processed 2"));
    }
}
