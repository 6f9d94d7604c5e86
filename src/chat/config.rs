//! Configuration types for the chat client.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML configuration
//! file, and the immutable [`ChatConfig`] both steps of a run are driven by.
//!
//! Values are layered, lowest precedence first: built-in defaults, the YAML file, the
//! environment, then command-line flags.

use std::str::FromStr;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};
use utf8path::Path;

use crate::client::{API_KEY_ENV, DEFAULT_API_URL};
use crate::error::EXIT_SUCCESS;
use crate::{
    ContextField, CreateSessionRequest, Error, ModelConfigs, QueryRequest, ResponseMode, Result,
};

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "ONDEMAND_BASE_URL";

/// Environment variable supplying the external user id.
pub const EXTERNAL_USER_ID_ENV: &str = "ONDEMAND_EXTERNAL_USER_ID";

/// Placeholder shipped in sample configurations; replaced by a generated id.
pub const EXTERNAL_USER_ID_PLACEHOLDER: &str = "<your_external_user_id>";

/// Default model endpoint.
pub const DEFAULT_ENDPOINT_ID: &str = "predefined-openai-gpt4o";

/// Default reasoning mode.
pub const DEFAULT_REASONING_MODE: &str = "medium";

/// Agents a session is scoped to unless configured otherwise.
pub const DEFAULT_AGENT_IDS: &[&str] = &[
    "agent-1713962163",
    "agent-1716837491",
    "agent-1715895836",
    "agent-1713924030",
    "agent-1716429542",
    "agent-1713967141",
    "agent-1713961903",
    "agent-1713958830",
    "agent-1713954536",
];

/// Command-line arguments for the ondemand-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// API key; falls back to ONDEMAND_API_KEY.
    #[arrrg(optional, "API key (default: $ONDEMAND_API_KEY)", "KEY")]
    pub api_key: Option<String>,

    /// Base URL of the chat API.
    #[arrrg(optional, "Base URL (default: https://api.on-demand.io/chat/v1)", "URL")]
    pub base_url: Option<String>,

    /// Identifier of the user owning the session.
    #[arrrg(optional, "External user id (default: a random UUID)", "ID")]
    pub external_user_id: Option<String>,

    /// The query text.  Trailing arguments are used when absent.
    #[arrrg(optional, "Query text", "TEXT")]
    pub query: Option<String>,

    /// Response mode.
    #[arrrg(optional, "Response mode: sync or stream (default: sync)", "MODE")]
    pub response_mode: Option<String>,

    /// Reasoning mode.
    #[arrrg(optional, "Reasoning mode (default: medium)", "MODE")]
    pub reasoning_mode: Option<String>,

    /// Model endpoint.
    #[arrrg(optional, "Endpoint id (default: predefined-openai-gpt4o)", "ENDPOINT")]
    pub endpoint_id: Option<String>,

    /// Comma-separated agent ids.
    #[arrrg(optional, "Comma-separated agent ids", "IDS")]
    pub agent_ids: Option<String>,

    /// Comma-separated `key=value` context metadata.
    #[arrrg(optional, "Comma-separated key=value context metadata", "PAIRS")]
    pub context: Option<String>,

    /// Fulfillment prompt.
    #[arrrg(optional, "Fulfillment prompt", "PROMPT")]
    pub fulfillment_prompt: Option<String>,

    /// Comma-separated stop sequences.
    #[arrrg(optional, "Comma-separated stop sequences", "SEQS")]
    pub stop_sequences: Option<String>,

    /// Sampling temperature.
    #[arrrg(optional, "Temperature (default: 0.7)", "FLOAT")]
    pub temperature: Option<String>,

    /// Nucleus sampling value.
    #[arrrg(optional, "Top-p (default: 1)", "FLOAT")]
    pub top_p: Option<String>,

    /// Maximum tokens to generate.
    #[arrrg(optional, "Max tokens, 0 for the endpoint default (default: 0)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Presence penalty.
    #[arrrg(optional, "Presence penalty (default: 0)", "FLOAT")]
    pub presence_penalty: Option<String>,

    /// Frequency penalty.
    #[arrrg(optional, "Frequency penalty (default: 0)", "FLOAT")]
    pub frequency_penalty: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "FILE")]
    pub config: Option<String>,

    /// Log at debug level.
    #[arrrg(flag, "Log requests and stream records at debug level")]
    pub verbose: bool,

    /// Exit 0 on request failures.
    #[arrrg(flag, "Exit 0 on request failures; only configuration errors fail")]
    pub lenient_exit: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// The contents of a YAML configuration file.
///
/// ```yaml
/// base_url: https://api.on-demand.io/chat/v1
/// response_mode: stream
/// agent_ids: [agent-1713962163, agent-1716837491]
/// context_metadata:
///   - { key: userId, value: "1" }
///   - { key: name, value: John }
/// model_configs:
///   temperature: 0.2
///   maxTokens: 512
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatFile {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub external_user_id: Option<String>,
    pub query: Option<String>,
    pub response_mode: Option<ResponseMode>,
    pub reasoning_mode: Option<String>,
    pub endpoint_id: Option<String>,
    pub agent_ids: Option<Vec<String>>,
    pub context_metadata: Option<Vec<ContextField>>,
    pub model_configs: Option<ModelConfigs>,
    pub timeout_secs: Option<u64>,
}

impl ChatFile {
    /// Load a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_str())
            .map_err(|e| Error::io(format!("could not read {}: {e}", path.as_str()), e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Configuration for one chat run.
///
/// This struct holds the resolved configuration values after layering the configuration
/// file, the environment and command-line arguments over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// API key sent in the `apikey` header.
    pub api_key: String,

    /// Base URL of the chat API.
    pub base_url: String,

    /// Identifier of the user owning the session.
    pub external_user_id: String,

    /// The query text.
    pub query: String,

    /// How the answer is delivered.
    pub response_mode: ResponseMode,

    /// How much reasoning the service spends on the query.
    pub reasoning_mode: String,

    /// The model endpoint.
    pub endpoint_id: String,

    /// Agents the session and query are scoped to.
    pub agent_ids: Vec<String>,

    /// Context metadata sent with the session and echoed with the answer.
    pub context_metadata: Vec<ContextField>,

    /// Model parameters.
    pub model_configs: ModelConfigs,

    /// Optional request timeout.
    pub timeout: Option<Duration>,

    /// Whether to log at debug level.
    pub verbose: bool,

    /// Whether request failures still exit 0.
    pub lenient_exit: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values for everything but the key and query.
    ///
    /// Defaults:
    /// - Base URL: https://api.on-demand.io/chat/v1
    /// - Response mode: sync
    /// - Reasoning mode: medium
    /// - Endpoint: predefined-openai-gpt4o
    /// - Agents: the default agent set
    /// - External user id: a random UUID
    pub fn new(api_key: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_URL.to_string(),
            external_user_id: generate_external_user_id(),
            query: query.into(),
            response_mode: ResponseMode::Sync,
            reasoning_mode: DEFAULT_REASONING_MODE.to_string(),
            endpoint_id: DEFAULT_ENDPOINT_ID.to_string(),
            agent_ids: DEFAULT_AGENT_IDS.iter().map(|id| id.to_string()).collect(),
            context_metadata: Vec::new(),
            model_configs: ModelConfigs::new(),
            timeout: None,
            verbose: false,
            lenient_exit: false,
            use_color: true,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the external user id.
    pub fn with_external_user_id(mut self, external_user_id: impl Into<String>) -> Self {
        self.external_user_id = external_user_id.into();
        self
    }

    /// Sets the response mode.
    pub fn with_response_mode(mut self, response_mode: ResponseMode) -> Self {
        self.response_mode = response_mode;
        self
    }

    /// Sets the agent ids.
    pub fn with_agent_ids(mut self, agent_ids: Vec<String>) -> Self {
        self.agent_ids = agent_ids;
        self
    }

    /// Sets the context metadata.
    pub fn with_context_metadata(mut self, context_metadata: Vec<ContextField>) -> Self {
        self.context_metadata = context_metadata;
        self
    }

    /// Sets the model parameters.
    pub fn with_model_configs(mut self, model_configs: ModelConfigs) -> Self {
        self.model_configs = model_configs;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether request failures still exit 0.
    pub fn with_lenient_exit(mut self, lenient_exit: bool) -> Self {
        self.lenient_exit = lenient_exit;
        self
    }

    /// Resolve configuration from parsed arguments and the process environment.
    ///
    /// `free` holds the trailing positional arguments, joined into the query when `--query`
    /// is absent.
    pub fn from_args(args: ChatArgs, free: Vec<String>) -> Result<Self> {
        Self::resolve(args, free, |name| std::env::var(name).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn resolve(
        args: ChatArgs,
        free: Vec<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ChatFile::from_file(&Path::from(path.as_str()))?,
            None => ChatFile::default(),
        };

        let api_key = args
            .api_key
            .or_else(|| env(API_KEY_ENV))
            .or(file.api_key)
            .ok_or_else(|| {
                Error::configuration(format!("set an API key with --api-key or {API_KEY_ENV}"))
            })?;
        crate::client::validate_api_key(&api_key)?;

        let positional = free.join(" ");
        let query = args
            .query
            .or_else(|| (!positional.trim().is_empty()).then_some(positional))
            .or(file.query)
            .filter(|query| !query.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration("no query given; pass --query or trailing arguments")
            })?;

        let mut config = ChatConfig::new(api_key, query);

        if let Some(base_url) = args.base_url.or_else(|| env(BASE_URL_ENV)).or(file.base_url) {
            config.base_url = base_url;
        }

        let external_user_id = args
            .external_user_id
            .or_else(|| env(EXTERNAL_USER_ID_ENV))
            .or(file.external_user_id);
        match external_user_id {
            Some(id) if !id.trim().is_empty() && id != EXTERNAL_USER_ID_PLACEHOLDER => {
                config.external_user_id = id;
            }
            _ => {
                tracing::warn!(
                    external_user_id = %config.external_user_id,
                    "no external user id configured; generated one"
                );
            }
        }

        if let Some(mode) = args.response_mode.map(ResponseMode::from).or(file.response_mode) {
            config.response_mode = mode;
        }
        if let Some(mode) = args.reasoning_mode.or(file.reasoning_mode) {
            config.reasoning_mode = mode;
        }
        if let Some(endpoint) = args.endpoint_id.or(file.endpoint_id) {
            config.endpoint_id = endpoint;
        }
        if let Some(agent_ids) = args.agent_ids.map(|ids| split_list(&ids)).or(file.agent_ids) {
            config.agent_ids = agent_ids;
        }
        config.context_metadata = match args.context {
            Some(context) => ContextField::parse_list(&context)?,
            None => file.context_metadata.unwrap_or_default(),
        };

        let mut model_configs = file.model_configs.unwrap_or_default();
        if let Some(prompt) = args.fulfillment_prompt {
            model_configs.fulfillment_prompt = prompt;
        }
        if let Some(stop_sequences) = args.stop_sequences {
            model_configs.stop_sequences = split_list(&stop_sequences);
        }
        if let Some(temperature) = args.temperature {
            model_configs.temperature = parse_number("temperature", &temperature)?;
        }
        if let Some(top_p) = args.top_p {
            model_configs.top_p = parse_number("top_p", &top_p)?;
        }
        if let Some(max_tokens) = args.max_tokens {
            model_configs.max_tokens = max_tokens;
        }
        if let Some(penalty) = args.presence_penalty {
            model_configs.presence_penalty = parse_number("presence_penalty", &penalty)?;
        }
        if let Some(penalty) = args.frequency_penalty {
            model_configs.frequency_penalty = parse_number("frequency_penalty", &penalty)?;
        }
        config.model_configs = model_configs;

        config.timeout = args
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs);
        config.verbose = args.verbose;
        config.lenient_exit = args.lenient_exit;
        config.use_color = !args.no_color;
        Ok(config)
    }

    /// The session-creation request for this configuration.
    pub fn session_request(&self) -> CreateSessionRequest {
        CreateSessionRequest::new(
            self.agent_ids.clone(),
            self.external_user_id.clone(),
            self.context_metadata.clone(),
        )
    }

    /// The query request for this configuration.
    pub fn query_request(&self) -> QueryRequest {
        QueryRequest {
            endpoint_id: self.endpoint_id.clone(),
            query: self.query.clone(),
            agent_ids: self.agent_ids.clone(),
            response_mode: self.response_mode.clone(),
            reasoning_mode: self.reasoning_mode.clone(),
            model_configs: self.model_configs.clone(),
        }
    }

    /// The process exit code for the outcome of a run.
    pub fn exit_code(&self, outcome: &Result<()>) -> i32 {
        match outcome {
            Ok(()) => EXIT_SUCCESS,
            Err(err) if self.lenient_exit && !err.is_configuration() => EXIT_SUCCESS,
            Err(err) => err.exit_code(),
        }
    }
}

fn generate_external_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse_number<T: FromStr>(param: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::validation(
            format!("'{value}' is not a valid number"),
            Some(param.to_string()),
        )
    })
}
