use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Token accounting reported with each completion.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionsUsage {
    /// Tokens consumed by the request messages.
    pub prompt_tokens: u32,

    /// Tokens generated for the reply.
    pub completion_tokens: u32,

    /// Sum of prompt and completion tokens.
    pub total_tokens: u32,
}

impl CompletionsUsage {
    /// Create a new `CompletionsUsage`, deriving the total.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

impl Add for CompletionsUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn usage_deserialization() {
        let usage: CompletionsUsage = serde_json::from_value(json!({
            "prompt_tokens": 12,
            "completion_tokens": 30,
            "total_tokens": 42
        }))
        .unwrap();
        assert_eq!(usage, CompletionsUsage::new(12, 30));
    }

    #[test]
    fn usage_adds() {
        let total = CompletionsUsage::new(1, 2) + CompletionsUsage::new(10, 20);
        assert_eq!(total.prompt_tokens, 11);
        assert_eq!(total.completion_tokens, 22);
        assert_eq!(total.total_tokens, 33);
    }
}
