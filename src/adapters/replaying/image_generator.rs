//! Replaying adapter for the `ImageGenerator` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::decoded_image;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::ArtError;
use crate::ports::image_generator::{EncodedImage, GenerateFuture, GenerationRequest, ImageGenerator};

const FAILURE_PREFIX: &str = "Generation failed: ";

/// Serves recorded generation results from a cassette.
pub struct ReplayingImageGenerator {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingImageGenerator {
    /// Create a replaying generator backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ImageGenerator for ReplayingImageGenerator {
    fn generate(&self, _request: &GenerationRequest) -> GenerateFuture<'_> {
        let output = next_output(&self.replayer, "image_generator", "generate");
        Box::pin(async move {
            let recorded = output.and_then(replay_result::<EncodedImage>).map_err(|message| {
                // Recorded failures carry the full display text.
                let message = message.strip_prefix(FAILURE_PREFIX).unwrap_or(&message);
                ArtError::generation(message)
            })?;
            decoded_image(&recorded.mime_type, recorded.data)
        })
    }
}
