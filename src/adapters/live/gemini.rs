//! Live adapter for the Gemini image editing API.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{api_failure, excerpt, http_client};
use crate::adapters::decoded_image;
use crate::error::ArtError;
use crate::ports::image_generator::{
    EncodedImage, GenerateFuture, GenerationRequest, GenerationResult, ImageGenerator,
};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Finish reasons Gemini uses when a candidate is withheld by policy.
const POLICY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
];

/// Live Gemini generator that calls the Google AI API.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiGenerator {
    /// Create a new Gemini generator with the given API key and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ArtError> {
        Ok(Self { client: http_client(timeout)?, api_key, base_url: GEMINI_API_BASE.to_string() })
    }

    /// Point the generator at another models endpoint.
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ImageGenerator for GeminiGenerator {
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_> {
        let url = format!("{}/{}:generateContent", self.base_url, request.model());
        let body = request_body(request);
        Box::pin(async move {
            let response =
                self.client.post(&url).header("x-goog-api-key", &self.api_key).json(&body).send().await?;

            let status = response.status();
            let response_text = response.text().await?;
            tracing::debug!("Gemini responded with HTTP {status}, {} bytes", response_text.len());

            parse_response(status, &response_text)
        })
    }
}

/// JSON payload embedding the source image and the prompt.
fn request_body(request: &GenerationRequest) -> serde_json::Value {
    let image = request.image();
    serde_json::json!({
        "contents": [{
            "parts": [
                {"inlineData": {"mimeType": image.mime_type, "data": image.to_base64()}},
                {"text": request.prompt().as_str()}
            ]
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE", "TEXT"]
        }
    })
}

/// Extract the first image from a `generateContent` response.
fn parse_response(status: StatusCode, body: &str) -> GenerationResult {
    if !status.is_success() {
        return Err(api_failure(status, body));
    }

    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| ArtError::generation(format!("Failed to parse response: {e}")))?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ArtError::generation(format!(
            "Request rejected by content policy ({reason})"
        )));
    }

    let mut texts = Vec::new();
    let mut withheld = None;
    for candidate in parsed.candidates {
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                let payload = EncodedImage::from_base64(inline.mime_type, &inline.data)
                    .map_err(ArtError::generation)?;
                return decoded_image(&payload.mime_type, payload.data);
            }
            if let Some(text) = part.text {
                texts.push(text);
            }
        }
        if let Some(reason) = candidate.finish_reason {
            if POLICY_FINISH_REASONS.contains(&reason.as_str()) {
                withheld = Some(reason);
            }
        }
    }

    if let Some(reason) = withheld {
        return Err(ArtError::generation(format!(
            "Request rejected by content policy ({reason})"
        )));
    }

    let said = texts.join(" ");
    if said.trim().is_empty() {
        Err(ArtError::generation(format!("No image in response. Body: {}", excerpt(body))))
    } else {
        Err(ArtError::generation(format!("The model answered without an image: {}", said.trim())))
    }
}

// --- Gemini API response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}
