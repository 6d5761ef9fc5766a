//! Builds a cassette from live interactions and writes it out.

use std::path::{Path, PathBuf};

use chrono::Utc;

use super::format::{Cassette, Interaction};

/// Accumulates a cassette in memory until [`CassetteRecorder::finish`].
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    cassette: Cassette,
}

impl CassetteRecorder {
    /// Start a cassette named `name`, to be written as `<dir>/<name>.cassette.yaml`.
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>, commit: impl Into<String>) -> Self {
        let name = name.into();
        let path = dir.as_ref().join(format!("{name}.cassette.yaml"));
        Self {
            path,
            cassette: Cassette {
                name,
                recorded_at: Utc::now(),
                commit: commit.into(),
                interactions: Vec::new(),
            },
        }
    }

    /// Where [`CassetteRecorder::finish`] will write.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an interaction; `seq` follows recording order.
    pub fn record(
        &mut self,
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) {
        let interactions = &mut self.cassette.interactions;
        interactions.push(Interaction {
            seq: interactions.len() as u64,
            port: port.into(),
            method: method.into(),
            input,
            output,
        });
    }

    /// Stamp the finish time and write the cassette.
    ///
    /// The YAML goes to a sibling `.tmp` file first and is renamed into place,
    /// so an interrupted write never leaves a truncated cassette behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn finish(mut self) -> Result<PathBuf, std::io::Error> {
        self.cassette.recorded_at = Utc::now();
        let yaml = serde_yaml::to_string(&self.cassette).map_err(std::io::Error::other)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            "Wrote {} interaction(s) to {}",
            self.cassette.interactions.len(),
            self.path.display()
        );
        Ok(self.path)
    }
}
