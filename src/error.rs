//! Unified error type for artiface.

use thiserror::Error;

/// Errors that can occur while normalizing, generating, or saving images.
#[derive(Debug, Error)]
pub enum ArtError {
    /// The input could not be decoded as an image.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The remote generation call failed. The message is meant for direct display.
    #[error("Generation failed: {message}")]
    GenerationFailure {
        /// Human-readable failure description.
        message: String,
    },

    /// A generation is already running for this session.
    #[error("A generation is already in progress")]
    AlreadyInFlight,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Output format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured for the provider.
    #[error("No API key for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The provider name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },
}

impl ArtError {
    /// Build a [`ArtError::GenerationFailure`] from any displayable message.
    pub fn generation(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "The generation service returned an unspecified error".to_string()
        } else {
            message
        };
        Self::GenerationFailure { message }
    }
}

impl From<reqwest::Error> for ArtError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::generation(format!("The generation service did not respond in time: {e}"))
        } else if e.is_connect() {
            Self::generation(format!("Could not reach the generation service: {e}"))
        } else {
            Self::generation(format!("Network error: {e}"))
        }
    }
}
