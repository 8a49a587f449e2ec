//! The seam between a chat session and the completion service.

use crate::client::AzureOpenAI;
use crate::error::Result;
use crate::types::{ChatCompletions, ChatCompletionsOptions};

/// Something that turns an ordered message list into a completion.
///
/// [`AzureOpenAI`] is the production implementation; tests script replies
/// by implementing this trait directly.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Request one completion for `options` from `deployment`.
    async fn chat_completions(
        &self,
        deployment: &str,
        options: &ChatCompletionsOptions,
    ) -> Result<ChatCompletions>;
}

#[async_trait::async_trait]
impl ChatTransport for AzureOpenAI {
    async fn chat_completions(
        &self,
        deployment: &str,
        options: &ChatCompletionsOptions,
    ) -> Result<ChatCompletions> {
        AzureOpenAI::chat_completions(self, deployment, options).await
    }
}
