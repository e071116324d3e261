//! Configuration loading, validation, and management for the helpdesk chatbot.
//!
//! Loads configuration from `helpdesk.toml` (or a path given on the command
//! line) with environment variable overrides. Validates all settings at load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `helpdesk.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion/embedding provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model used for the knowledge index
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Completion temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,

    /// Provider endpoint configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Session store configuration
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Static prompt file locations
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Metrics persistence configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_completion_tokens() -> u32 {
    800
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("provider", &self.provider)
            .field("knowledge", &self.knowledge)
            .field("sessions", &self.sessions)
            .field("prompts", &self.prompts)
            .field("gateway", &self.gateway)
            .field("metrics", &self.metrics)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name (informational, shows up in logs)
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Index backend: "memory" (ephemeral) or "file" (persisted)
    #[serde(default = "default_knowledge_backend")]
    pub backend: String,

    /// Source document for ingestion
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,

    /// Persisted index location (used by the "file" backend)
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Maximum chunks returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity score for a chunk to be considered relevant
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Character budget for the retrieved-knowledge prompt section.
    /// Chunks that would overflow it are dropped from the tail, never sliced.
    #[serde(default = "default_max_knowledge_chars")]
    pub max_knowledge_chars: usize,
}

fn default_knowledge_backend() -> String {
    "memory".into()
}
fn default_document_path() -> PathBuf {
    PathBuf::from("prompts/knowledge_base.txt")
}
fn default_index_path() -> PathBuf {
    PathBuf::from("data/knowledge_index.jsonl")
}
fn default_chunk_size() -> usize {
    400
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_top_k() -> usize {
    3
}
fn default_score_threshold() -> f32 {
    0.3
}
fn default_max_knowledge_chars() -> usize {
    4000
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: default_knowledge_backend(),
            document_path: default_document_path(),
            index_path: default_index_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            max_knowledge_chars: default_max_knowledge_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Session backend: "memory" or "file"
    #[serde(default = "default_sessions_backend")]
    pub backend: String,

    /// Directory for file-backed sessions
    #[serde(default = "default_sessions_dir")]
    pub dir: PathBuf,

    /// Session time-to-live in seconds, refreshed on access
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,

    /// Trailing window of prior turns included in the prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_sessions_backend() -> String {
    "memory".into()
}
fn default_sessions_dir() -> PathBuf {
    PathBuf::from("data/sessions")
}
fn default_session_ttl() -> u64 {
    1800
}
fn default_history_window() -> usize {
    20
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            backend: default_sessions_backend(),
            dir: default_sessions_dir(),
            ttl_secs: default_session_ttl(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    /// System instructions file
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt: PathBuf,

    /// Behaviour guidelines file
    #[serde(default = "default_guidelines_path")]
    pub guidelines: PathBuf,
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("prompts/system_prompt.txt")
}
fn default_guidelines_path() -> PathBuf {
    PathBuf::from("prompts/behaviour_guidelines.txt")
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt_path(),
            guidelines: default_guidelines_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5001
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics are persisted to disk
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics JSON file location
    #[serde(default = "default_metrics_path")]
    pub path: PathBuf,
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("data/metrics.json")
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`helpdesk.toml` in the
    /// working directory).
    ///
    /// Environment variable overrides (highest priority):
    /// - `HELPDESK_API_KEY` or `OPENAI_API_KEY` for the API key
    /// - `HELPDESK_MODEL` for the completion model
    /// - `HELPDESK_BASE_URL` for the provider endpoint
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("helpdesk.toml"))
    }

    /// Load configuration from a specific file path with env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        if config.api_key.is_none() {
            config.api_key = std::env::var("HELPDESK_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("HELPDESK_MODEL") {
            config.model = model;
        }

        if let Ok(base_url) = std::env::var("HELPDESK_BASE_URL") {
            config.provider.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.knowledge.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_size must be > 0".into(),
            ));
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_overlap must be smaller than chunk_size".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.knowledge.score_threshold) {
            return Err(ConfigError::ValidationError(
                "knowledge.score_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.knowledge.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.top_k must be > 0".into(),
            ));
        }

        if self.sessions.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "sessions.history_window must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_completion_tokens: default_max_completion_tokens(),
            provider: ProviderConfig::default(),
            knowledge: KnowledgeConfig::default(),
            sessions: SessionsConfig::default(),
            prompts: PromptsConfig::default(),
            gateway: GatewayConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.gateway.port, 5001);
        assert_eq!(config.knowledge.top_k, 3);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.knowledge.chunk_size, config.knowledge.chunk_size);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = AppConfig::default();
        config.knowledge.chunk_overlap = config.knowledge.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn score_threshold_out_of_range_rejected() {
        let mut config = AppConfig::default();
        config.knowledge.score_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/helpdesk.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
model = "gpt-4o"

[gateway]
port = 8080

[knowledge]
score_threshold = 0.5
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.gateway.port, 8080);
        assert!((config.knowledge.score_threshold - 0.5).abs() < f32::EPSILON);
        // Untouched sections keep defaults
        assert_eq!(config.sessions.ttl_secs, 1800);
        assert_eq!(config.knowledge.chunk_size, 400);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("5001"));
    }
}
