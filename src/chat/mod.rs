//! Chat application module for interactive conversations with a deployment.
//!
//! This module provides a line-oriented REPL chat interface built on top of
//! the chatline client library. It supports:
//!
//! - Multi-turn conversations sent in full on every request
//! - Optional retrieval of context documents from a search index
//! - Slash commands for session control
//! - Configuration from arguments, environment, and a YAML settings file
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Core chat session management and service interaction
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{
    ChatArgs, ChatConfig, DEFAULT_DEPLOYMENT, DEFAULT_SYSTEM_PROMPT, ENV_DEPLOYMENT,
    ENV_EMBEDDING_DEPLOYMENT, ENV_ENDPOINT, ENV_KEY, ENV_SEARCH_ENDPOINT, ENV_SEARCH_INDEX,
    ENV_SEARCH_KEY, SearchConfig, SearchSettings, Settings,
};
pub use session::{ChatSession, SessionStats};
