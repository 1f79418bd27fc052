//! Error types for the Curio server.

use std::path::PathBuf;

use curio_gateway::GatewayError;

/// A specialized `Result` type for server operations.
pub type Result<T> = std::result::Result<T, CurioError>;

/// Errors that can occur while configuring or starting the server.
///
/// Variants carry an actionable suggestion where one exists.
#[derive(Debug, thiserror::Error)]
pub enum CurioError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your curio.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The upstream API key is not set.
    #[error("API key not found in environment variable '{var}'\n\nSuggestion: export {var}=<your key> before starting the server")]
    MissingApiKey {
        /// Name of the environment variable that was checked.
        var: String,
    },

    // ========================================================================
    // Upstream Errors
    // ========================================================================
    /// The generation gateway could not be built or failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error (binding the listener, reading files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CurioError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `MissingApiKey` error.
    #[must_use]
    pub fn missing_api_key(var: impl Into<String>) -> Self {
        Self::MissingApiKey { var: var.into() }
    }
}
