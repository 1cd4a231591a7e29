use serde::{Deserialize, Serialize};

/// Main configuration structure for project-assist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Chat-completions backend configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Remote planner/mail API configuration
    #[serde(default)]
    pub graph: GraphConfig,

    /// Outgoing mail configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Conversation loop configuration
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which chat-completions flavor to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatProvider {
    #[serde(rename = "azure-openai")]
    AzureOpenAi,
    #[serde(rename = "openai")]
    OpenAi,
}

impl ChatProvider {
    /// Environment variable consulted when no api_key is configured
    pub const fn api_key_env(self) -> &'static str {
        match self {
            Self::AzureOpenAi => "AZURE_OPENAI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: ChatProvider,

    /// Resource endpoint (Azure) or API base URL (OpenAI)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Azure deployment name, or model name for OpenAI
    #[serde(default = "default_deployment")]
    pub deployment: String,

    /// API key (can also be set via AZURE_OPENAI_API_KEY / OPENAI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Azure `api-version` query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on tool-call round trips within one generation
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Ask the backend for a JSON object response
    #[serde(default = "default_json_mode")]
    pub json_mode: bool,
}

const fn default_provider() -> ChatProvider {
    ChatProvider::AzureOpenAi
}

fn default_endpoint() -> String {
    "https://localhost.openai.azure.com".to_string()
}

fn default_deployment() -> String {
    "gpt-4o".to_string()
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_max_tokens() -> u32 {
    2000
}

const fn default_generation_timeout() -> u64 {
    120
}

const fn default_max_tool_rounds() -> u32 {
    8
}

const fn default_json_mode() -> bool {
    true
}

impl GenerationConfig {
    /// Configured key, falling back to the provider's environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            deployment: default_deployment(),
            api_key: None,
            api_version: default_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            max_tool_rounds: default_max_tool_rounds(),
            json_mode: default_json_mode(),
        }
    }
}

/// Remote planner/mail API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GraphConfig {
    /// Versioned API root
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,

    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u64,

    /// Client-side request budget shared by all calls
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

fn default_graph_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}

const fn default_graph_timeout() -> u64 {
    30
}

const fn default_requests_per_minute() -> u32 {
    120
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            timeout_secs: default_graph_timeout(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MailConfig {
    /// Mailbox to send from; the signed-in user when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConversationConfig {
    /// Correction turns allowed before a turn fails
    #[serde(default = "default_max_contract_retries")]
    pub max_contract_retries: u32,
}

const fn default_max_contract_retries() -> u32 {
    3
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_contract_retries: default_max_contract_retries(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
