//! Scripted backend for development and testing

use crate::{
    BackendError, BackendMetadata, Completion, CompletionBackend, CompletionRequest, Result,
    TokenUsage,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<String>>>),
    Responder(Responder),
}

/// Replays canned replies and records every request it receives
pub struct ScriptedBackend {
    script: Script,
    usage_per_call: TokenUsage,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    /// Reply with each of `replies` in turn, then fail with [`BackendError::Exhausted`]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = replies.into_iter().map(|r| Ok(r.into())).collect();
        Self::from_script(Script::Queue(Mutex::new(queue)))
    }

    /// Compute each reply from the request
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self::from_script(Script::Responder(Box::new(responder)))
    }

    /// A backend whose every call fails the same way
    pub fn failing(kind: ScriptedFailure) -> Self {
        Self::with_responder(move |_| Err(kind.to_error()))
    }

    fn from_script(script: Script) -> Self {
        Self {
            script,
            usage_per_call: TokenUsage::new(100, 20),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Token usage reported for each call
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage_per_call = usage;
        self
    }

    /// Queue a failure after the replies already scripted
    pub fn push_failure(&self, kind: ScriptedFailure) {
        if let Script::Queue(queue) = &self.script {
            queue.lock().push_back(Err(kind.to_error()));
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Failure modes a scripted backend can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Unavailable,
    Timeout,
    Malformed,
}

impl ScriptedFailure {
    fn to_error(self) -> BackendError {
        match self {
            ScriptedFailure::Unavailable => {
                BackendError::Unavailable("HTTP 503: scripted outage".to_string())
            }
            ScriptedFailure::Timeout => BackendError::Timeout(Duration::from_secs(30)),
            ScriptedFailure::Malformed => BackendError::Response("scripted garbage".to_string()),
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let reply = match &self.script {
            Script::Queue(queue) => queue.lock().pop_front().unwrap_or(Err(BackendError::Exhausted)),
            Script::Responder(responder) => responder(&request),
        };
        self.requests.lock().push(request);

        Ok(Completion {
            text: reply?,
            usage: self.usage_per_call,
        })
    }

    fn metadata(&self) -> BackendMetadata {
        BackendMetadata {
            name: "Scripted backend".to_string(),
            model: "scripted".to_string(),
            endpoint: None,
        }
    }
}
