//! Configuration types for the Curio server.
//!
//! Settings come from `curio.json` in the working directory; every field is
//! optional. The upstream API key is never stored in the file, only the name
//! of the environment variable holding it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CurioError, Result};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "curio.json";

/// Default address the HTTP server binds to.
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

/// Default HTTP port.
const fn default_port() -> u16 {
    3000
}

/// Default chat-completions endpoint.
fn default_api_url() -> String {
    "https://api.perplexity.ai/chat/completions".to_string()
}

/// Default model name.
fn default_model() -> String {
    "sonar".to_string()
}

/// Default environment variable holding the API key.
fn default_api_key_env() -> String {
    "PERPLEXITY_API_KEY".to_string()
}

/// Default upstream request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    60
}

/// Main configuration for the Curio server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Text-generation service settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            upstream: UpstreamConfig::default(),
        }
    }
}

/// Settings for the upstream chat-completions service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamConfig {
    /// Full URL of the chat-completions endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable the API key is read from.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CurioError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `curio.json` from a specific directory, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the defaults. Unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CurioError::ConfigParseError` if the file cannot be read or
    /// parsed, and `CurioError::ConfigValidationError` if a value is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CurioError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CurioError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `CurioError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(CurioError::config_validation(
                "bindAddress must not be empty",
                "Set bindAddress to an IP address such as 127.0.0.1 in your curio.json",
            ));
        }

        let api_url = self.upstream.api_url.trim();
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(CurioError::config_validation(
                format!("upstream.apiUrl must be an http(s) URL, got '{api_url}'"),
                "Set upstream.apiUrl to the full chat-completions endpoint in your curio.json",
            ));
        }

        if self.upstream.model.trim().is_empty() {
            return Err(CurioError::config_validation(
                "upstream.model must not be empty",
                "Set upstream.model to a model name (e.g. 'sonar') in your curio.json",
            ));
        }

        if self.upstream.api_key_env.trim().is_empty() {
            return Err(CurioError::config_validation(
                "upstream.apiKeyEnv must not be empty",
                "Set upstream.apiKeyEnv to the environment variable holding your API key",
            ));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(CurioError::config_validation(
                "upstream.timeoutSecs must be greater than 0",
                "Set upstream.timeoutSecs to at least 1 in your curio.json",
            ));
        }

        Ok(())
    }

    /// `host:port` string for binding the listener.
    #[must_use]
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Reads the upstream API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `CurioError::MissingApiKey` if the variable is unset or blank.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.upstream.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CurioError::missing_api_key(var)),
        }
    }
}
