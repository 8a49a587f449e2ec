//! Console chat client for hosted chat-completion deployments, with optional
//! retrieval of context documents from a search index.

// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod render;
pub mod retrieval;
pub mod search;
pub mod transport;
pub mod types;

// Re-exports
pub use client::AzureOpenAI;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use retrieval::{Retriever, SearchAugmenter, VectorSearch, augment_system_prompt};
pub use search::SearchClient;
pub use transport::ChatTransport;
pub use types::*;
