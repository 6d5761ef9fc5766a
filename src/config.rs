//! TOML configuration: API keys plus defaults for flags left off the command line.
//!
//! ```toml
//! [keys]
//! gemini = "..."
//!
//! [defaults]
//! model = "nano-banana"
//! max_dimension = 768
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ArtError;
use crate::model::Provider;
use crate::normalize::{DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY};

/// Environment variable naming an alternative config file.
const CONFIG_ENV: &str = "ARTIFACE_CONFIG";

/// Parsed config file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider credentials.
    pub keys: KeysConfig,
    /// Fallbacks for command-line flags.
    pub defaults: DefaultsConfig,
}

/// Provider credentials; environment variables take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Gemini API key.
    pub gemini: Option<String>,
    /// `OpenAI` API key.
    pub openai: Option<String>,
}

/// Values used when the matching flag is absent.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Model name or alias.
    pub model: String,
    /// Output format.
    pub format: String,
    /// Long-edge bound applied to uploads.
    pub max_dimension: u32,
    /// JPEG quality used for uploads.
    pub quality: u8,
    /// Optional byte budget for uploads.
    pub max_bytes: Option<usize>,
    /// Request timeout for the generation call, in seconds.
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: "nano-banana".into(),
            format: "png".into(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
            max_bytes: None,
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Pick the config file: `--config`, then `ARTIFACE_CONFIG`, then
    /// `~/.config/artiface/config.toml` (`./artiface.toml` without a home).
    #[must_use]
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(|| match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(".config/artiface/config.toml"),
                None => PathBuf::from("artiface.toml"),
            })
    }

    /// Read `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Config`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ArtError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .map_err(|e| ArtError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ArtError::Config(format!("Cannot read {}: {e}", path.display()))),
        }
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// API key for `provider`, environment first. Blank values count as unset.
    #[must_use]
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        let from_file = match provider {
            Provider::Gemini => self.keys.gemini.as_ref(),
            Provider::OpenAi => self.keys.openai.as_ref(),
        };
        std::env::var(provider.key_env_var())
            .ok()
            .or_else(|| from_file.cloned())
            .filter(|key| !key.trim().is_empty())
    }
}
