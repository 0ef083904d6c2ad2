use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_CONCURRENT_ANALYSES: usize = 8;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(String),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Settings for the Gemini label extractor.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn from_env(provider: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |key| env::var(key).ok())
    }

    /// Build the config from any key lookup, `{PREFIX}_{NAME}` style.
    pub fn from_lookup<F>(provider: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = provider.to_uppercase();
        let key = |name: &str| format!("{}_{}", prefix, name);

        let api_key = lookup(&key("API_KEY"))
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing(key("API_KEY")))?;

        let model = lookup(&key("MODEL")).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let api_url = lookup(&key("API_URL"))
            .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs: u64 = parse_or(&lookup, &key("TIMEOUT_SECS"), 300)?;

        Ok(Self {
            api_key,
            model,
            api_url,
            temperature: parse_or(&lookup, &key("TEMPERATURE"), 0.1)?,
            top_p: parse_or(&lookup, &key("TOP_P"), 0.95)?,
            top_k: parse_or(&lookup, &key("TOP_K"), 40)?,
            max_output_tokens: parse_or(&lookup, &key("MAX_OUTPUT_TOKENS"), 16384)?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// HTTP-facing limits.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_upload_bytes: usize,
    pub max_concurrent_analyses: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_concurrent_analyses: DEFAULT_MAX_CONCURRENT_ANALYSES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_concurrent_analyses: parse_or(
                &lookup,
                "MAX_CONCURRENT_ANALYSES",
                DEFAULT_MAX_CONCURRENT_ANALYSES,
            )?
            .max(1),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
