use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat-style completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single completion request: instruction, few-shot turns and the live input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    /// `None` leaves the sampling temperature to the provider default
    pub temperature: Option<f32>,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Text of the last user turn, i.e. the live input
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Token counts reported for one or more backend calls
///
/// Totals from independent calls combine by plain addition, so batch runs can
/// fold usage in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0 && self.prompt_tokens == 0 && self.completion_tokens == 0
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

impl Sum for TokenUsage {
    fn sum<I: Iterator<Item = TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), Add::add)
    }
}

/// A completed backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend type ("http")
    pub backend_type: String,
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Bearer token; filled in from the environment, never written to disk
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
    /// Client-side request timeout
    pub timeout_secs: u64,
    /// Additional metadata for specific implementations
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: "http".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 30,
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_sums_are_order_independent() {
        let a = TokenUsage::new(120, 14);
        let b = TokenUsage::new(98, 20);
        let c = TokenUsage::new(7, 1);

        let forward: TokenUsage = [a, b, c].into_iter().sum();
        let backward: TokenUsage = [c, b, a].into_iter().sum();

        assert_eq!(forward, backward);
        assert_eq!(forward.prompt_tokens, 225);
        assert_eq!(forward.completion_tokens, 35);
        assert_eq!(forward.total_tokens, 260);
    }

    #[test]
    fn api_key_is_not_serialized() {
        let config = BackendConfig {
            api_key: Some("sk-secret".to_string()),
            ..BackendConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let request = CompletionRequest {
            model: "m".to_string(),
            temperature: Some(0.0),
            messages: vec![
                ChatMessage::system("rules"),
                ChatMessage::user("Move up 36mm"),
                ChatMessage::assistant("delta_x, delta_y, delta_z = 0.0, 0.0, 36.0"),
                ChatMessage::user("Shift left for 54cm"),
            ],
        };
        assert_eq!(request.last_user_message(), Some("Shift left for 54cm"));
    }
}
