//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the conversation
//! and performs one request per user message.

use crate::chat::config::ChatConfig;
use crate::error::Result;
use crate::observability::{SESSION_FAILURES, SESSION_RETRIEVAL_FALLBACKS, SESSION_TURNS};
use crate::retrieval::{Retriever, augment_system_prompt};
use crate::transport::ChatTransport;
use crate::types::{ChatCompletionsOptions, ChatMessage, CompletionsUsage, RetrievedDocument};

/// A chat session that manages conversation state and service interactions.
///
/// The session keeps the ordered user and assistant turns.  The system prompt
/// is configuration, not a turn: it is prepended to each request.
pub struct ChatSession<T: ChatTransport> {
    transport: T,
    config: ChatConfig,
    retriever: Option<Box<dyn Retriever>>,
    retrieval_enabled: bool,
    turns: Vec<ChatMessage>,
    usage_totals: CompletionsUsage,
    last_turn_usage: Option<CompletionsUsage>,
    request_count: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The deployment used for the session.
    pub deployment: String,
    /// The number of turns in the conversation.
    pub turn_count: usize,
    /// The maximum tokens per response.
    pub max_tokens: u32,
    /// The system prompt, if any.
    pub system_prompt: Option<String>,
    /// The sampling temperature, if set.
    pub temperature: Option<f32>,
    /// The top-p value, if set.
    pub top_p: Option<f32>,
    /// The configured stop sequences.
    pub stop_sequences: Vec<String>,
    /// The search index consulted before each request, when retrieval is on.
    pub search_index: Option<String>,
    /// Total prompt tokens across all requests.
    pub total_prompt_tokens: u64,
    /// Total completion tokens across all requests.
    pub total_completion_tokens: u64,
    /// Total number of requests made.
    pub total_requests: u64,
    /// Usage for the last successful turn, if any.
    pub last_turn_usage: Option<CompletionsUsage>,
}

impl<T: ChatTransport> ChatSession<T> {
    /// Creates a new chat session with the given transport and configuration.
    pub fn new(transport: T, config: ChatConfig) -> Self {
        Self {
            transport,
            config,
            retriever: None,
            retrieval_enabled: true,
            turns: Vec::new(),
            usage_totals: CompletionsUsage::default(),
            last_turn_usage: None,
            request_count: 0,
        }
    }

    /// Attaches a retriever consulted before each request.
    pub fn with_retriever(mut self, retriever: Box<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Sends a user message and returns the assistant's reply.
    ///
    /// This method:
    /// 1. Adds the user message to the conversation
    /// 2. Fetches context from the retriever, if one is attached and enabled
    /// 3. Sends the system prompt and every turn to the deployment
    /// 4. Adds the reply to the conversation
    ///
    /// A retrieval failure is logged and the request goes out without context.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the request fails and a protocol error if
    /// the response carries no reply.  Either way the user message stays in
    /// the conversation and no assistant turn is added.
    pub async fn send(&mut self, user_text: &str) -> Result<String> {
        self.turns.push(ChatMessage::user(user_text));

        let documents = self.retrieve(user_text).await;
        let options = self.request_options(&documents);

        self.request_count = self.request_count.saturating_add(1);
        let (reply, usage) = match self
            .transport
            .chat_completions(&self.config.deployment, &options)
            .await
            .and_then(|completions| {
                let reply = completions.reply_text()?.to_string();
                Ok((reply, completions.usage))
            }) {
            Ok(pair) => pair,
            Err(err) => {
                SESSION_FAILURES.click();
                tracing::warn!(
                    error = %err,
                    transport = err.is_transport(),
                    "chat request failed"
                );
                return Err(err);
            }
        };

        if let Some(usage) = usage {
            self.record_usage(usage);
        }
        self.turns.push(ChatMessage::assistant(reply.clone()));
        SESSION_TURNS.click();
        Ok(reply)
    }

    async fn retrieve(&self, user_text: &str) -> Vec<RetrievedDocument> {
        let Some(retriever) = self.retriever.as_ref().filter(|_| self.retrieval_enabled) else {
            return Vec::new();
        };
        match retriever.query(user_text).await {
            Ok(documents) => documents,
            Err(err) => {
                SESSION_RETRIEVAL_FALLBACKS.click();
                tracing::warn!(error = %err, "retrieval failed; sending request without context");
                Vec::new()
            }
        }
    }

    /// Builds the request for the current conversation plus `documents`.
    fn request_options(&self, documents: &[RetrievedDocument]) -> ChatCompletionsOptions {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        if let Some(system) =
            augment_system_prompt(self.config.system_prompt.as_deref(), documents)
        {
            messages.push(ChatMessage::system(system));
        }
        messages.extend(self.turns.iter().cloned());

        ChatCompletionsOptions::new(messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_top_p(self.config.top_p)
            .with_stop(self.config.stop_sequences.clone())
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Returns the conversation so far, oldest first.
    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    /// Returns the number of turns in the conversation.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Changes the deployment used for responses.
    pub fn set_deployment(&mut self, deployment: impl Into<String>) {
        self.config.deployment = deployment.into();
    }

    /// Returns the current deployment.
    pub fn deployment(&self) -> &str {
        &self.config.deployment
    }

    /// Sets or clears the system prompt.
    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.config.system_prompt = prompt;
    }

    /// Returns the current system prompt, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.config.system_prompt.as_deref()
    }

    /// Sets the maximum tokens per response.
    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        self.config.max_tokens = max_tokens;
    }

    /// Sets the sampling temperature.
    pub fn set_temperature(&mut self, temperature: Option<f32>) {
        self.config.temperature = temperature;
    }

    /// Sets the top-p value.
    pub fn set_top_p(&mut self, top_p: Option<f32>) {
        self.config.top_p = top_p;
    }

    /// Adds a stop sequence to the persistent list.
    pub fn add_stop_sequence(&mut self, sequence: String) {
        if !self
            .config
            .stop_sequences
            .iter()
            .any(|existing| existing == &sequence)
        {
            self.config.stop_sequences.push(sequence);
        }
    }

    /// Clears all stop sequences.
    pub fn clear_stop_sequences(&mut self) {
        self.config.stop_sequences.clear();
    }

    /// Returns the configured stop sequences.
    pub fn stop_sequences(&self) -> &[String] {
        &self.config.stop_sequences
    }

    /// Turns retrieval on or off.  Returns whether a retriever is attached.
    pub fn set_retrieval_enabled(&mut self, enabled: bool) -> bool {
        self.retrieval_enabled = enabled;
        self.retriever.is_some()
    }

    /// Returns true when a retriever is attached and enabled.
    pub fn retrieval_enabled(&self) -> bool {
        self.retrieval_enabled && self.retriever.is_some()
    }

    /// Returns usage for the last successful turn, if the service reported it.
    pub fn last_usage(&self) -> Option<CompletionsUsage> {
        self.last_turn_usage
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let config = &self.config;
        SessionStats {
            deployment: config.deployment.clone(),
            turn_count: self.turn_count(),
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            stop_sequences: config.stop_sequences.clone(),
            search_index: config
                .search
                .as_ref()
                .filter(|_| self.retrieval_enabled())
                .map(|search| search.index.clone()),
            total_prompt_tokens: u64::from(self.usage_totals.prompt_tokens),
            total_completion_tokens: u64::from(self.usage_totals.completion_tokens),
            total_requests: self.request_count,
            last_turn_usage: self.last_turn_usage,
        }
    }

    fn record_usage(&mut self, usage: CompletionsUsage) {
        self.last_turn_usage = Some(usage);
        self.usage_totals = self.usage_totals + usage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{ChatCompletions, ChatRole};
    use std::sync::Mutex;

    struct EchoTransport {
        requests: Mutex<Vec<ChatCompletionsOptions>>,
    }

    impl EchoTransport {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatTransport for EchoTransport {
        async fn chat_completions(
            &self,
            _deployment: &str,
            options: &ChatCompletionsOptions,
        ) -> Result<ChatCompletions> {
            self.requests.lock().unwrap().push(options.clone());
            let last = options.messages.last().map(|m| m.text()).unwrap_or("");
            Ok(ChatCompletions::from_reply(
                format!("echo: {last}"),
                CompletionsUsage::new(10, 5),
            ))
        }
    }

    struct FailingRetriever;

    #[async_trait::async_trait]
    impl Retriever for FailingRetriever {
        async fn query(&self, _text: &str) -> Result<Vec<RetrievedDocument>> {
            Err(Error::connection("search service unreachable", None))
        }
    }

    fn config() -> ChatConfig {
        ChatConfig::new("https://example.openai.azure.com/", "key")
    }

    #[test]
    fn new_session_empty() {
        let session = ChatSession::new(EchoTransport::new(), config());
        assert_eq!(session.turn_count(), 0);
        assert!(!session.retrieval_enabled());
        assert!(session.last_usage().is_none());
    }

    #[tokio::test]
    async fn send_appends_both_turns() {
        let mut session = ChatSession::new(EchoTransport::new(), config());
        let reply = session.send("hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
        assert_eq!(
            session.turns(),
            &[ChatMessage::user("hello"), ChatMessage::assistant("echo: hello")]
        );
        assert_eq!(session.last_usage(), Some(CompletionsUsage::new(10, 5)));
    }

    #[tokio::test]
    async fn request_starts_with_system_prompt() {
        let mut session = ChatSession::new(
            EchoTransport::new(),
            config()
                .with_system_prompt(Some("Talk like a pirate.".to_string()))
                .with_stop_sequences(vec!["END".to_string()]),
        );
        session.send("first").await.unwrap();
        session.send("second").await.unwrap();

        let requests = session.transport.requests.lock().unwrap();
        let last = requests.last().unwrap();
        let roles: Vec<ChatRole> = last.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::System,
                ChatRole::User,
                ChatRole::Assistant,
                ChatRole::User
            ]
        );
        assert_eq!(last.messages[0].text(), "Talk like a pirate.");
        assert_eq!(last.max_tokens, Some(2000));
        assert_eq!(last.temperature, Some(0.7));
        assert_eq!(last.stop, Some(vec!["END".to_string()]));
    }

    #[tokio::test]
    async fn retrieval_failure_degrades() {
        let mut session = ChatSession::new(
            EchoTransport::new(),
            config().with_system_prompt(Some("Be brief.".to_string())),
        )
        .with_retriever(Box::new(FailingRetriever));
        assert!(session.retrieval_enabled());

        let reply = session.send("speeders").await.unwrap();
        assert_eq!(reply, "echo: speeders");
        let requests = session.transport.requests.lock().unwrap();
        assert_eq!(requests[0].messages[0].text(), "Be brief.");
    }

    #[tokio::test]
    async fn stats_accumulate() {
        let mut session = ChatSession::new(EchoTransport::new(), config());
        session.send("one").await.unwrap();
        session.send("two").await.unwrap();
        let stats = session.stats();
        assert_eq!(stats.turn_count, 4);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.total_prompt_tokens, 20);
        assert_eq!(stats.total_completion_tokens, 10);
        assert!(stats.search_index.is_none());
    }

    #[tokio::test]
    async fn clear_session() {
        let mut session = ChatSession::new(EchoTransport::new(), config());
        session.send("test").await.unwrap();
        assert_eq!(session.turn_count(), 2);

        session.clear();
        assert_eq!(session.turn_count(), 0);
    }

    #[test]
    fn setters() {
        let mut session = ChatSession::new(EchoTransport::new(), config());

        session.set_deployment("gpt-4");
        assert_eq!(session.deployment(), "gpt-4");

        session.set_system_prompt(None);
        assert!(session.system_prompt().is_none());

        session.add_stop_sequence("END".to_string());
        session.add_stop_sequence("END".to_string());
        assert_eq!(session.stop_sequences(), &["END".to_string()]);
        session.clear_stop_sequences();
        assert!(session.stop_sequences().is_empty());

        assert!(!session.set_retrieval_enabled(true));
        assert!(!session.retrieval_enabled());
    }
}
