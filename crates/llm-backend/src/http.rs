//! HTTP client for an OpenAI-compatible chat-completions endpoint.

use crate::{
    BackendConfig, BackendError, BackendMetadata, ChatMessage, Completion, CompletionBackend,
    CompletionRequest, Result, TokenUsage,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

pub struct HttpBackend {
    config: BackendConfig,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self {
            config,
            timeout,
            client,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.config.api_key {
            let value = format!("Bearer {}", key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value)
                    .map_err(|e| BackendError::Unavailable(format!("invalid api key: {e}")))?,
            );
        }
        Ok(headers)
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Unavailable(err.to_string())
        }
    }
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

// Expected response: { choices: [{ message: { content } }], usage: { prompt_tokens, ... } }
#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(serde::Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let model = if request.model.is_empty() {
            self.config.model.as_str()
        } else {
            request.model.as_str()
        };
        let body = ChatRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Unavailable(format!("HTTP {}: {}", status, text)));
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Response(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Response("missing choices".to_string()))?;

        tracing::debug!(
            "completion from {} in {}ms",
            model,
            start.elapsed().as_millis()
        );

        Ok(Completion {
            text: content,
            usage: parsed.usage.unwrap_or_default(),
        })
    }

    fn metadata(&self) -> BackendMetadata {
        BackendMetadata {
            name: "OpenAI-compatible HTTP backend".to_string(),
            model: self.config.model.clone(),
            endpoint: Some(self.config.endpoint.clone()),
        }
    }
}
