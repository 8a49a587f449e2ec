use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Default cap on reply length.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Request body for a chat-completions call.
///
/// The deployment is part of the URL rather than the body, so it is passed
/// alongside this struct instead of inside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionsOptions {
    /// The ordered messages that make up the request context.
    pub messages: Vec<ChatMessage>,

    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling mass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Sequences that end generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl ChatCompletionsOptions {
    /// Create options for the given messages with no sampling overrides.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: None,
            top_p: None,
            stop: None,
        }
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set or clear the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set or clear the nucleus sampling mass.
    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the stop sequences; an empty list sends none.
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = if stop.is_empty() { None } else { Some(stop) };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn minimal_options() {
        let options = ChatCompletionsOptions::new(vec![ChatMessage::user("hi")]);
        assert_eq!(
            to_value(&options).unwrap(),
            json!({
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn full_options() {
        let options = ChatCompletionsOptions::new(vec![
            ChatMessage::system("Talk like a pirate."),
            ChatMessage::user("hi"),
        ])
        .with_max_tokens(DEFAULT_MAX_TOKENS)
        .with_temperature(Some(0.5))
        .with_top_p(Some(0.25))
        .with_stop(vec!["END".to_string()]);

        assert_eq!(
            to_value(&options).unwrap(),
            json!({
                "messages": [
                    {"role": "system", "content": "Talk like a pirate."},
                    {"role": "user", "content": "hi"}
                ],
                "max_tokens": 2000,
                "temperature": 0.5,
                "top_p": 0.25,
                "stop": ["END"]
            })
        );
    }

    #[test]
    fn empty_stop_is_omitted() {
        let options = ChatCompletionsOptions::new(Vec::new()).with_stop(Vec::new());
        assert!(options.stop.is_none());
    }
}
