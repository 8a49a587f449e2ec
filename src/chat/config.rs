//! Configuration types for the chat application.
//!
//! Settings come from four places, highest precedence first: command-line
//! arguments parsed with `arrrg`, the process environment (which the binary
//! seeds from a `.env` file), an optional YAML settings file, and built-in
//! defaults.

use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retrieval::{DEFAULT_CONTENT_FIELD, DEFAULT_VECTOR_FIELD};
use crate::types::{DEFAULT_MAX_TOKENS, DEFAULT_SEARCH_TOP, DEFAULT_TEMPERATURE};

/// Deployment used when none is configured.
pub const DEFAULT_DEPLOYMENT: &str = "gpt-35-turbo";

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Environment variable naming the chat resource endpoint.
pub const ENV_ENDPOINT: &str = "OPENAI_ENDPOINT";
/// Environment variable holding the chat resource key.
pub const ENV_KEY: &str = "OPENAI_KEY";
/// Environment variable naming the chat deployment.
pub const ENV_DEPLOYMENT: &str = "OPENAI_DEPLOYMENT";
/// Environment variable naming the embedding deployment.
pub const ENV_EMBEDDING_DEPLOYMENT: &str = "OPENAI_EMBEDDING_DEPLOYMENT";
/// Environment variable naming the search service endpoint.
pub const ENV_SEARCH_ENDPOINT: &str = "AZURE_SEARCH_ENDPOINT";
/// Environment variable holding the search service key.
pub const ENV_SEARCH_KEY: &str = "AZURE_SEARCH_KEY";
/// Environment variable naming the search index.
pub const ENV_SEARCH_INDEX: &str = "AZURE_SEARCH_INDEX";

/// Command-line arguments for the chatline tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// YAML settings file.
    #[arrrg(optional, "YAML settings file", "PATH")]
    pub settings: Option<String>,

    /// Chat resource endpoint.
    #[arrrg(optional, "Chat endpoint URL (default: $OPENAI_ENDPOINT)", "URL")]
    pub endpoint: Option<String>,

    /// Deployment to chat with.
    #[arrrg(optional, "Deployment name (default: gpt-35-turbo)", "NAME")]
    pub deployment: Option<String>,

    /// System prompt to set context for the conversation.
    #[arrrg(optional, "System prompt for the conversation", "PROMPT")]
    pub system: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 2000)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature 0.0-2.0 (default: 0.7)", "TEMP")]
    pub temperature: Option<String>,

    /// Search index to draw context from.
    #[arrrg(optional, "Search index for retrieval (default: $AZURE_SEARCH_INDEX)", "INDEX")]
    pub search_index: Option<String>,

    /// Disable retrieval even when a search index is configured.
    #[arrrg(flag, "Disable retrieval")]
    pub no_search: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log retrieval and request details.
    #[arrrg(flag, "Log retrieval and request details")]
    pub verbose: bool,
}

/// Contents of a YAML settings file.  Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Chat resource endpoint.
    pub endpoint: Option<String>,
    /// Chat resource key.
    pub api_key: Option<String>,
    /// Deployment to chat with.
    pub deployment: Option<String>,
    /// API version for chat and embeddings requests.
    pub api_version: Option<String>,
    /// System prompt.
    pub system_prompt: Option<String>,
    /// Maximum tokens per response.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling mass.
    pub top_p: Option<f32>,
    /// Stop sequences.
    pub stop_sequences: Option<Vec<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Retrieval settings.
    pub search: Option<SearchSettings>,
}

/// Retrieval section of a YAML settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    /// Search service endpoint.
    pub endpoint: Option<String>,
    /// Search service key.
    pub api_key: Option<String>,
    /// Index to query.
    pub index: Option<String>,
    /// Field holding document text.
    pub content_field: Option<String>,
    /// Documents per query.
    pub top: Option<u32>,
    /// Semantic configuration name.
    pub semantic_configuration: Option<String>,
    /// Embedding deployment for hybrid search.
    pub embedding_deployment: Option<String>,
    /// Vector field for hybrid search.
    pub vector_field: Option<String>,
}

impl Settings {
    /// Parse settings from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read settings from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(
                format!("failed to read settings file {}", path.display()),
                err,
            )
        })?;
        Self::from_yaml(&content)
    }
}

/// Resolved retrieval configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Search service endpoint.
    pub endpoint: String,
    /// Search service key.
    pub api_key: String,
    /// Index to query.
    pub index: String,
    /// Field holding document text.
    pub content_field: String,
    /// Documents per query.
    pub top: u32,
    /// Semantic configuration name.
    pub semantic_configuration: Option<String>,
    /// Embedding deployment for hybrid search.
    pub embedding_deployment: Option<String>,
    /// Vector field for hybrid search.
    pub vector_field: String,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after merging
/// arguments, environment, and settings file with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Chat resource endpoint.
    pub endpoint: String,

    /// Chat resource key.
    pub api_key: String,

    /// The deployment that generates replies.
    pub deployment: String,

    /// API version override for chat and embeddings requests.
    pub api_version: Option<String>,

    /// Optional system prompt prepended to every request.
    pub system_prompt: Option<String>,

    /// Maximum tokens per response.
    pub max_tokens: u32,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Optional top-p nucleus sampling value.
    pub top_p: Option<f32>,

    /// Custom stop sequences supplied on every request.
    pub stop_sequences: Vec<String>,

    /// Request timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log retrieval and request details.
    pub verbose: bool,

    /// Retrieval settings; `None` disables retrieval.
    pub search: Option<SearchConfig>,
}

impl ChatConfig {
    /// Creates a new ChatConfig for `endpoint` with default values.
    ///
    /// Defaults:
    /// - Deployment: gpt-35-turbo
    /// - Max tokens: 2000
    /// - Temperature: 0.7
    /// - Color: enabled
    /// - Retrieval: disabled
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: None,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: Some(DEFAULT_TEMPERATURE),
            top_p: None,
            stop_sequences: Vec::new(),
            timeout: None,
            use_color: true,
            verbose: false,
            search: None,
        }
    }

    /// Merge arguments, environment, and settings into a configuration.
    ///
    /// `env` looks up an environment variable; empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint or key is missing, if a
    /// value does not parse, or if a search index was requested without a
    /// search endpoint and key.
    pub fn resolve<F>(args: ChatArgs, settings: Settings, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let endpoint = args
            .endpoint
            .or_else(|| env(ENV_ENDPOINT))
            .or(settings.endpoint)
            .ok_or_else(|| missing("chat endpoint", ENV_ENDPOINT))?;
        let api_key = env(ENV_KEY)
            .or(settings.api_key)
            .ok_or_else(|| missing("chat API key", ENV_KEY))?;

        let mut config = ChatConfig::new(endpoint, api_key);
        if let Some(deployment) = args
            .deployment
            .or_else(|| env(ENV_DEPLOYMENT))
            .or(settings.deployment)
        {
            config.deployment = deployment;
        }
        config.api_version = settings.api_version;
        if let Some(prompt) = args.system.or(settings.system_prompt) {
            config.system_prompt = if prompt.trim().is_empty() {
                None
            } else {
                Some(prompt)
            };
        }
        config.max_tokens = args
            .max_tokens
            .or(settings.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);
        if config.max_tokens == 0 {
            return Err(Error::configuration(
                "max tokens must be positive",
                Some("max_tokens".to_string()),
            ));
        }
        let temperature = match args.temperature {
            Some(arg) => Some(parse_temperature(&arg)?),
            None => settings.temperature,
        };
        if let Some(temperature) = temperature {
            check_range(temperature, 0.0, 2.0, "temperature")?;
            config.temperature = Some(temperature);
        }
        if let Some(top_p) = settings.top_p {
            check_range(top_p, 0.0, 1.0, "top_p")?;
            config.top_p = Some(top_p);
        }
        config.stop_sequences = settings.stop_sequences.unwrap_or_default();
        config.timeout = settings.timeout_secs.map(Duration::from_secs);
        config.use_color = !args.no_color;
        config.verbose = args.verbose;

        if !args.no_search {
            config.search = resolve_search(args.search_index, settings.search, &env)?;
        }
        Ok(config)
    }

    /// Sets the deployment to use.
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    /// Sets or clears the system prompt.
    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: Option<f32>) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets the stop sequences.
    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = stop_sequences;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the retrieval configuration.
    pub fn with_search(mut self, search: Option<SearchConfig>) -> Self {
        self.search = search;
        self
    }
}

fn resolve_search<F>(
    index_arg: Option<String>,
    settings: Option<SearchSettings>,
    env: &F,
) -> Result<Option<SearchConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = settings.unwrap_or_default();
    let endpoint = env(ENV_SEARCH_ENDPOINT).or(settings.endpoint);
    let api_key = env(ENV_SEARCH_KEY).or(settings.api_key);
    let index = index_arg.or_else(|| env(ENV_SEARCH_INDEX)).or(settings.index);

    let (endpoint, api_key, index) = match (endpoint, api_key, index) {
        (Some(endpoint), Some(api_key), Some(index)) => (endpoint, api_key, index),
        (None, _, Some(_)) => return Err(missing("search endpoint", ENV_SEARCH_ENDPOINT)),
        (_, None, Some(_)) => return Err(missing("search API key", ENV_SEARCH_KEY)),
        (Some(_), Some(_), None) => {
            tracing::warn!(
                "search endpoint and key are set but no index is named; retrieval disabled"
            );
            return Ok(None);
        }
        _ => return Ok(None),
    };

    Ok(Some(SearchConfig {
        endpoint,
        api_key,
        index,
        content_field: settings
            .content_field
            .unwrap_or_else(|| DEFAULT_CONTENT_FIELD.to_string()),
        top: settings.top.unwrap_or(DEFAULT_SEARCH_TOP),
        semantic_configuration: settings.semantic_configuration,
        embedding_deployment: env(ENV_EMBEDDING_DEPLOYMENT).or(settings.embedding_deployment),
        vector_field: settings
            .vector_field
            .unwrap_or_else(|| DEFAULT_VECTOR_FIELD.to_string()),
    }))
}

fn missing(what: &str, variable: &str) -> Error {
    Error::configuration(
        format!("{what} is not configured; set {variable} in the environment or .env"),
        Some(variable.to_string()),
    )
}

fn parse_temperature(value: &str) -> Result<f32> {
    value.trim().parse::<f32>().map_err(|_| {
        Error::configuration(
            format!("temperature must be a number, got {value:?}"),
            Some("temperature".to_string()),
        )
    })
}

fn check_range(value: f32, min: f32, max: f32, setting: &str) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::configuration(
            format!("{setting} must be between {min} and {max}"),
            Some(setting.to_string()),
        ))
    }
}
