// Public modules
pub mod chat_completions;
pub mod chat_completions_options;
pub mod chat_message;
pub mod chat_role;
pub mod completions_usage;
pub mod embeddings;
pub mod retrieved_document;
pub mod search_options;

// Re-exports
pub use chat_completions::{ChatChoice, ChatCompletions, FinishReason};
pub use chat_completions_options::{
    ChatCompletionsOptions, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use chat_message::ChatMessage;
pub use chat_role::{ChatRole, ChatRoleParseError};
pub use completions_usage::CompletionsUsage;
pub use embeddings::{EmbeddingItem, Embeddings, EmbeddingsOptions};
pub use retrieved_document::RetrievedDocument;
pub use search_options::{
    DEFAULT_SEARCH_TOP, DEFAULT_SEMANTIC_MAX_WAIT_MS, SearchOptions, SearchResults, VectorQuery,
};
