//! Error types for course generation.

use curio_course::ExtractError;

/// A specialized `Result` type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while generating course content.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request was rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The upstream service answered with a non-success status.
    #[error("Upstream API error: {status} - {body}")]
    Upstream {
        /// HTTP status returned upstream.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The upstream answered but carried no generated text.
    #[error("No content generated")]
    EmptyContent,

    /// The upstream response envelope could not be read.
    #[error("Unexpected upstream response: {0}")]
    InvalidEnvelope(String),

    /// The generated text was not the expected JSON document.
    #[error(transparent)]
    Malformed(#[from] ExtractError),

    /// The request never completed (DNS, connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a new `Upstream` error.
    #[must_use]
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// HTTP status a server should answer with for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Upstream { status, .. } => *status,
            Self::EmptyContent
            | Self::InvalidEnvelope(_)
            | Self::Malformed(_)
            | Self::Transport(_) => 500,
        }
    }

    /// Returns `true` if repeating the same request might succeed.
    ///
    /// Nothing in this crate retries; callers decide.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            Self::InvalidInput(_)
            | Self::EmptyContent
            | Self::InvalidEnvelope(_)
            | Self::Malformed(_) => false,
        }
    }
}
