use serde::{Deserialize, Serialize};

use crate::types::ChatRole;

/// One role-tagged message in a chat-completion exchange.
///
/// The session keeps its conversation as an ordered `Vec<ChatMessage>`; every
/// request carries the whole sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// The author of the message.
    pub role: ChatRole,

    /// The text of the message.
    ///
    /// Responses may carry a null content (for example when a content filter
    /// fires), so this is optional on the wire.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    /// Create a new `ChatMessage` with the given role and content.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// The message text, or the empty string when there is none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn message_serialization() {
        let message = ChatMessage::user("Hello");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": "Hello"
            })
        );
    }

    #[test]
    fn message_with_null_content() {
        let message: ChatMessage =
            serde_json::from_value(json!({"role": "assistant", "content": null})).unwrap();
        assert_eq!(message.role, ChatRole::Assistant);
        assert!(message.content.is_none());
        assert_eq!(message.text(), "");
    }

    #[test]
    fn message_without_content_field() {
        let message: ChatMessage = serde_json::from_value(json!({"role": "assistant"})).unwrap();
        assert!(message.content.is_none());
    }
}
