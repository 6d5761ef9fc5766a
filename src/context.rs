//! Service context that selects the generator adapter for the current mode.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::live::gemini::GeminiGenerator;
use crate::adapters::live::openai::OpenAiGenerator;
use crate::adapters::recording::image_generator::RecordingImageGenerator;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Config;
use crate::error::ArtError;
use crate::model::Provider;
use crate::ports::ImageGenerator;

/// Where recording mode writes cassettes, relative to the working directory.
const CASSETTE_DIR: &str = ".artiface/cassettes";

/// Bundles the port trait objects.
pub struct ServiceContext {
    /// Image generator port.
    pub generator: Box<dyn ImageGenerator>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Finish the recording and write the cassette file to disk.
    ///
    /// The context that owns the recording generator must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the recorder is still shared or the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create a live context for the given provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured.
    pub fn live(provider: Provider, config: &Config, timeout: Duration) -> Result<Self, ArtError> {
        let key = config.api_key(provider).ok_or_else(|| ArtError::MissingApiKey {
            provider: provider.name().into(),
            env_var: provider.key_env_var().into(),
        })?;
        tracing::debug!("Using live {} adapter, timeout {}s", provider.name(), timeout.as_secs());
        let generator: Box<dyn ImageGenerator> = match provider {
            Provider::Gemini => Box::new(GeminiGenerator::new(key, timeout)?),
            Provider::OpenAi => Box::new(OpenAiGenerator::new(key, timeout)?),
        };
        Ok(Self { generator })
    }

    /// Create a recording context that wraps a live adapter with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the live adapter cannot be created.
    pub fn recording(
        provider: Provider,
        config: &Config,
        timeout: Duration,
    ) -> Result<(Self, RecordingSession), ArtError> {
        let live_ctx = Self::live(provider, config, timeout)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let name = format!("{timestamp}-{}", provider.name().to_lowercase());
        let recorder = CassetteRecorder::new(CASSETTE_DIR, name, get_commit_hash());
        tracing::info!("Recording to {}", recorder.path().display());
        let recorder = Arc::new(Mutex::new(recorder));

        let recording_gen = RecordingImageGenerator::new(live_ctx.generator, Arc::clone(&recorder));

        Ok((Self { generator: Box::new(recording_gen) }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, ArtError> {
        let replayer = CassetteReplayer::from_file(path)
            .map_err(|e| ArtError::Config(format!("Failed to load cassette: {e}")))?;
        let generator = Box::new(ReplayingImageGenerator::new(Arc::new(Mutex::new(replayer))));
        Ok(Self { generator })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
