//! Image generator port for AI image transformation APIs.

use std::future::Future;
use std::pin::Pin;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ArtError;

/// An image payload together with its MIME type.
///
/// The bytes travel as base64 whenever the image is serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// MIME type of the image (e.g., `"image/jpeg"`).
    pub mime_type: String,
    /// Raw encoded image bytes.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl EncodedImage {
    /// Create an encoded image from raw bytes.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self { mime_type: mime_type.into(), data }
    }

    /// Decode a standard base64 payload.
    ///
    /// # Errors
    ///
    /// Returns an error message if the payload is not valid base64.
    pub fn from_base64(mime_type: impl Into<String>, payload: &str) -> Result<Self, String> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| format!("Failed to decode base64: {e}"))?;
        Ok(Self::new(mime_type, data))
    }

    /// The content as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    ///
    /// # Errors
    ///
    /// Returns an error message if the URL is not a base64 data URL.
    pub fn from_data_url(url: &str) -> Result<Self, String> {
        let rest = url.strip_prefix("data:").ok_or("Not a data URL")?;
        let (header, payload) = rest.split_once(',').ok_or("Data URL has no payload")?;
        let mime_type = header.strip_suffix(";base64").ok_or("Data URL is not base64-encoded")?;
        if mime_type.is_empty() {
            return Err("Data URL has no MIME type".to_string());
        }
        Self::from_base64(mime_type, payload)
    }

    /// File extension matching the MIME type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

/// A free-text instruction describing the desired transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StylePrompt(String);

impl StylePrompt {
    /// Create a prompt, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidArgument`] if the prompt is empty.
    pub fn new(text: impl AsRef<str>) -> Result<Self, ArtError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(ArtError::InvalidArgument("Style prompt must not be empty".into()));
        }
        Ok(Self(text.to_string()))
    }

    /// The prompt text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A source image paired with a style prompt, ready for submission.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    model: String,
    image: EncodedImage,
    prompt: StylePrompt,
}

impl GenerationRequest {
    /// Build a request for the given resolved model identifier.
    pub fn new(model: impl Into<String>, image: EncodedImage, prompt: StylePrompt) -> Self {
        Self { model: model.into(), image, prompt }
    }

    /// The resolved model identifier (e.g., `"gemini-2.5-flash-image"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The normalized source image.
    #[must_use]
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// The style prompt.
    #[must_use]
    pub fn prompt(&self) -> &StylePrompt {
        &self.prompt
    }
}

/// Outcome of a generation call.
pub type GenerationResult = Result<EncodedImage, ArtError>;

/// Boxed future type returned by [`ImageGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = GenerationResult> + Send + 'a>>;

/// Transforms an image according to a prompt via an external API.
pub trait ImageGenerator: Send + Sync {
    /// Submit the request and wait for the single response.
    fn generate(&self, request: &GenerationRequest) -> GenerateFuture<'_>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as base64 string.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize base64 string to bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
