use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ChatMessage, CompletionsUsage};

/// Why the deployment stopped generating a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of the reply or a stop sequence.
    Stop,

    /// The reply hit `max_tokens`.
    Length,

    /// Content was withheld by the service's filter.
    ContentFilter,

    /// The model asked to call a function.
    FunctionCall,

    /// The model asked to call tools.
    ToolCalls,

    /// A reason this client does not know about.
    #[serde(other)]
    Other,
}

/// One candidate reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    #[serde(default)]
    pub message: Option<ChatMessage>,

    /// Why generation stopped, if the service reported it.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Response body of a chat-completions call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletions {
    /// Service-assigned response identifier.
    #[serde(default)]
    pub id: String,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: u64,

    /// Candidate replies; this client requests one.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,

    /// Token accounting for the call.
    #[serde(default)]
    pub usage: Option<CompletionsUsage>,
}

impl ChatCompletions {
    /// Build a single-choice response, mostly useful for scripted transports.
    pub fn from_reply(reply: impl Into<String>, usage: CompletionsUsage) -> Self {
        Self {
            id: String::new(),
            created: 0,
            choices: vec![ChatChoice {
                index: 0,
                message: Some(ChatMessage::assistant(reply)),
                finish_reason: Some(FinishReason::Stop),
            }],
            usage: Some(usage),
        }
    }

    /// Extract the text of the first choice.
    ///
    /// # Errors
    ///
    /// Returns a protocol error when there is no choice, the choice has no
    /// message, or the message has no content.
    pub fn reply_text(&self) -> Result<&str> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| Error::protocol("response contained no choices"))?;
        let message = choice
            .message
            .as_ref()
            .ok_or_else(|| Error::protocol("first choice carried no message"))?;
        match message.content.as_deref() {
            Some(content) => Ok(content),
            None if choice.finish_reason == Some(FinishReason::ContentFilter) => Err(
                Error::protocol("reply was withheld by the service's content filter"),
            ),
            None => Err(Error::protocol("first choice carried no content")),
        }
    }
}
