//! Adapter implementations for port traits.
//!
//! - `live/`: Gemini and `OpenAI` API clients
//! - `recording/`: Record interactions to cassettes
//! - `replaying/`: Replay interactions from cassettes

pub mod live;
pub mod recording;
pub mod replaying;

use crate::error::ArtError;
use crate::ports::{EncodedImage, GenerationResult};

/// Accept a returned payload only if it decodes as an image.
///
/// The MIME type comes from the content; `declared_mime` is what the service
/// (or cassette) claimed and is only used for logging.
pub(crate) fn decoded_image(declared_mime: &str, data: Vec<u8>) -> GenerationResult {
    let undecodable =
        |e: image::ImageError| ArtError::generation(format!("Response image could not be decoded: {e}"));
    let format = image::guess_format(&data).map_err(undecodable)?;
    image::load_from_memory_with_format(&data, format).map_err(undecodable)?;

    let mime_type = format.to_mime_type();
    if mime_type != declared_mime {
        tracing::debug!("Response labelled {declared_mime} is actually {mime_type}");
    }
    Ok(EncodedImage::new(mime_type, data))
}
