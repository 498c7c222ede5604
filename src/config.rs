//! Service configuration: TOML file, then `.env`/environment overrides.

use crate::postprocessing::segments::SegmentRules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: String, value: String },
    #[error("Default provider '{0}' is not configured")]
    UnknownProvider(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub gate: GateConfig,
    pub output: OutputConfig,
    pub segments: SegmentRules,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub permissive_cors: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub default_provider: String,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub providers: BTreeMap<String, ProviderConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// PocketBase base URL. Sessions are kept in memory when unset.
    pub pocketbase_url: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub collection: String,
    pub request_timeout_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GateConfig {
    pub min_query_length: usize,
    pub min_alphanumeric_ratio: f64,
    pub educational_keywords: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub max_final_code_lines: usize,
    pub memory_sessions: usize,
    pub memory_interactions_per_session: usize,
    pub memory_interaction_chars: usize,
    pub memory_items: usize,
    pub memory_chars: usize,
    pub persisted_response_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            permissive_cors: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "claude".to_string(),
            ProviderConfig {
                api_url: "https://api.anthropic.com/v1".to_string(),
                api_key: String::new(),
                model: "claude-sonnet-4-20250514".to_string(),
            },
        );
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                api_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "gpt-4o".to_string(),
            },
        );
        providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                api_url: "http://localhost:11434/v1".to_string(),
                api_key: String::new(),
                model: "llama3.1".to_string(),
            },
        );

        Self {
            default_provider: "claude".to_string(),
            request_timeout_seconds: 60,
            max_retries: 3,
            retry_delay_ms: 1000,
            max_tokens: None,
            temperature: Some(0.7),
            providers,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pocketbase_url: None,
            admin_email: None,
            admin_password: None,
            collection: "learning_sessions".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_query_length: 3,
            min_alphanumeric_ratio: 0.55,
            educational_keywords: [
                "aprender", "aprendiz", "estudar", "estudo", "explicar", "como ", "como fazer",
                "resolver", "solucionar", "exemplo", "exercício", "trabalhado", "worked example",
                "algoritmo", "program", "código", "codigo", "matem", "lógica", "conceito",
                "scaffolding", "socrático", "socratic", "analogia", "didátic", "didatic",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_final_code_lines: 150,
            memory_sessions: 5,
            memory_interactions_per_session: 2,
            memory_interaction_chars: 160,
            memory_items: 8,
            memory_chars: 1000,
            persisted_response_chars: 2000,
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without touching the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config file");
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay values from a variable lookup (the process environment in production).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.default_provider = provider;
        }

        let default_provider = self.llm.default_provider.clone();
        if let Some(provider) = self.llm.providers.get_mut(&default_provider) {
            if let Some(url) = lookup("API_URL") {
                provider.api_url = url;
            }
            if let Some(key) = lookup("API_KEY") {
                provider.api_key = key;
            }
            if let Some(model) = lookup("MODEL") {
                provider.model = model;
            }
        }

        if let Some(url) = lookup("POCKETBASE_URL") {
            self.store.pocketbase_url = Some(url);
        }
        if let Some(email) = lookup("POCKETBASE_ADMIN_EMAIL") {
            self.store.admin_email = Some(email);
        }
        if let Some(password) = lookup("POCKETBASE_ADMIN_PASSWORD") {
            self.store.admin_password = Some(password);
        }
        debug!("Environment overrides applied");
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.llm.providers.contains_key(&self.llm.default_provider) {
            return Err(ConfigError::UnknownProvider(
                self.llm.default_provider.clone(),
            ));
        }

        for (name, provider) in &self.llm.providers {
            check_url(&format!("llm.providers.{}.api_url", name), &provider.api_url)?;
        }
        if let Some(url) = &self.store.pocketbase_url {
            check_url("store.pocketbase_url", url)?;
        }

        if !(0.0..=1.0).contains(&self.gate.min_alphanumeric_ratio) {
            return Err(ConfigError::InvalidValue {
                field: "gate.min_alphanumeric_ratio".to_string(),
                reason: format!("{} is outside [0, 1]", self.gate.min_alphanumeric_ratio),
            });
        }
        if self.output.max_final_code_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "output.max_final_code_lines".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map(|_| ()).map_err(|_| ConfigError::InvalidUrl {
        field: field.to_string(),
        value: value.to_string(),
    })
}
