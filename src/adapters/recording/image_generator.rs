//! Recording adapter for the `ImageGenerator` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::image_generator::{GenerateFuture, GenerationRequest, ImageGenerator};

/// Records generation interactions while delegating to an inner implementation.
pub struct RecordingImageGenerator {
    inner: Box<dyn ImageGenerator>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingImageGenerator {
    /// Creates a new recording generator wrapping the given implementation.
    pub fn new(inner: Box<dyn ImageGenerator>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

/// What a cassette keeps of a request: the upload is summarized, not stored.
#[derive(Serialize)]
struct RecordedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    image_mime_type: &'a str,
    image_bytes: usize,
}

impl<'a> From<&'a GenerationRequest> for RecordedRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            model: request.model(),
            prompt: request.prompt().as_str(),
            image_mime_type: &request.image().mime_type,
            image_bytes: request.image().data.len(),
        }
    }
}

impl ImageGenerator for RecordingImageGenerator {
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.generate(&request).await;
            record_result(
                &recorder,
                "image_generator",
                "generate",
                &RecordedRequest::from(&request),
                &result,
            );
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArtError;
    use crate::ports::{EncodedImage, StylePrompt};

    struct FixedGenerator(Result<Vec<u8>, String>);

    impl ImageGenerator for FixedGenerator {
        fn generate(&self, _request: &GenerationRequest) -> GenerateFuture<'_> {
            let result = self.0.clone();
            Box::pin(async move {
                result.map(|data| EncodedImage::new("image/png", data)).map_err(ArtError::generation)
            })
        }
    }

    #[tokio::test]
    async fn records_summary_and_result() {
        let dir = std::env::temp_dir().join("artiface_recording_adapter_test");
        let _ = std::fs::remove_dir_all(&dir);
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&dir, "rec", "abc")));

        let generator = RecordingImageGenerator::new(
            Box::new(FixedGenerator(Ok(vec![1, 2, 3]))),
            Arc::clone(&recorder),
        );
        let request = GenerationRequest::new(
            "gemini-2.5-flash-image",
            EncodedImage::new("image/jpeg", vec![0; 64]),
            StylePrompt::new("pixel art").unwrap(),
        );
        let image = generator.generate(&request).await.unwrap();
        assert_eq!(image.data, vec![1, 2, 3]);
        drop(generator);

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        let path = recorder.finish().unwrap();

        let cassette: crate::cassette::format::Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let interaction = &cassette.interactions[0];
        assert_eq!(interaction.input["prompt"], "pixel art");
        assert_eq!(interaction.input["image_bytes"], 64);
        assert_eq!(interaction.output["Ok"]["data"], "AQID");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
