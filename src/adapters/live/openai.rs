//! Live adapter for the `OpenAI` image edits API.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{api_failure, excerpt, http_client};
use crate::adapters::decoded_image;
use crate::error::ArtError;
use crate::ports::image_generator::{
    EncodedImage, GenerateFuture, GenerationRequest, GenerationResult, ImageGenerator,
};

const OPENAI_EDITS_URL: &str = "https://api.openai.com/v1/images/edits";

/// `gpt-image-*` models return PNG unless asked otherwise.
const DEFAULT_OUTPUT_MIME: &str = "image/png";

/// Live `OpenAI` generator that calls the Images edits endpoint.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    edits_url: String,
}

impl OpenAiGenerator {
    /// Create a new `OpenAI` generator with the given API key and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ArtError> {
        Ok(Self { client: http_client(timeout)?, api_key, edits_url: OPENAI_EDITS_URL.to_string() })
    }

    /// Point the generator at another edits endpoint.
    #[cfg(test)]
    pub(crate) fn with_edits_url(mut self, edits_url: impl Into<String>) -> Self {
        self.edits_url = edits_url.into();
        self
    }
}

impl ImageGenerator for OpenAiGenerator {
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let image = request.image();
            let file_part = Part::bytes(image.data.clone())
                .file_name(format!("source.{}", image.extension()))
                .mime_str(&image.mime_type)?;

            let form = Form::new()
                .text("model", request.model().to_string())
                .text("prompt", request.prompt().as_str().to_string())
                .text("n", "1")
                .part("image", file_part);

            let response = self
                .client
                .post(&self.edits_url)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;
            tracing::debug!("OpenAI responded with HTTP {status}, {} bytes", response_text.len());

            parse_response(status, &response_text)
        })
    }
}

fn parse_response(status: StatusCode, body: &str) -> GenerationResult {
    if !status.is_success() {
        return Err(api_failure(status, body));
    }

    let parsed: OpenAiResponse = serde_json::from_str(body)
        .map_err(|e| ArtError::generation(format!("Failed to parse response: {e}")))?;

    let item = parsed.data.into_iter().find_map(|d| d.b64_json).ok_or_else(|| {
        ArtError::generation(format!("No image in response. Body: {}", excerpt(body)))
    })?;

    let payload =
        EncodedImage::from_base64(DEFAULT_OUTPUT_MIME, &item).map_err(ArtError::generation)?;
    decoded_image(&payload.mime_type, payload.data)
}

// --- OpenAI API response types ---

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    b64_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StylePrompt;

    fn failure_message(result: GenerationResult) -> String {
        match result {
            Err(ArtError::GenerationFailure { message }) => message,
            other => panic!("expected a generation failure, got {other:?}"),
        }
    }

    fn encoded(format: image::ImageFormat) -> String {
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(5, 3).write_to(&mut buf, format).unwrap();
        EncodedImage::new("application/octet-stream", buf.into_inner()).to_base64()
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/images/edits", listener.local_addr().unwrap());
        let generator = OpenAiGenerator::new("key".into(), Duration::from_millis(200))
            .unwrap()
            .with_edits_url(url);
        let request = GenerationRequest::new(
            "gpt-image-1",
            EncodedImage::new("image/jpeg", vec![0xFF, 0xD8]),
            StylePrompt::new("comic book").unwrap(),
        );

        let msg = failure_message(generator.generate(&request).await);
        assert!(msg.contains("did not respond in time"), "{msg}");
        drop(listener);
    }

    #[test]
    fn extracts_b64_json() {
        let body = format!(
            r#"{{"created":1,"data":[{{"b64_json":"{}"}}]}}"#,
            encoded(image::ImageFormat::Png)
        );
        let image = parse_response(StatusCode::OK, &body).unwrap();
        assert_eq!(image.mime_type, "image/png");
        let decoded = image::load_from_memory(&image.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }

    #[test]
    fn jpeg_output_is_labelled_jpeg() {
        let body = format!(r#"{{"data":[{{"b64_json":"{}"}}]}}"#, encoded(image::ImageFormat::Jpeg));
        let image = parse_response(StatusCode::OK, &body).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn non_image_b64_json_is_failure() {
        let msg = failure_message(parse_response(StatusCode::OK, r#"{"data":[{"b64_json":"AQID"}]}"#));
        assert!(msg.starts_with("Response image could not be decoded"));
    }

    #[test]
    fn missing_data_is_failure() {
        let msg = failure_message(parse_response(StatusCode::OK, r#"{"data":[]}"#));
        assert!(msg.starts_with("No image in response"));
    }

    #[test]
    fn url_only_response_is_failure() {
        let body = r#"{"data":[{"url":"https://example.invalid/a.png"}]}"#;
        assert!(parse_response(StatusCode::OK, body).is_err());
    }

    #[test]
    fn moderation_rejection_is_policy_failure() {
        let body = r#"{"error":{"message":"Your request was rejected by the safety system.","type":"image_generation_user_error","code":"moderation_blocked"}}"#;
        let msg = failure_message(parse_response(StatusCode::BAD_REQUEST, body));
        assert!(msg.starts_with("Request rejected by content policy"));
    }

    #[test]
    fn unauthorized_is_failure() {
        let body = r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#;
        let msg = failure_message(parse_response(StatusCode::UNAUTHORIZED, body));
        assert_eq!(msg, "Incorrect API key provided (HTTP 401)");
    }
}
