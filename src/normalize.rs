//! Client-side image normalization before upload.
//!
//! Arbitrary user files are decoded, scaled down so the long edge fits the
//! configured maximum, and re-encoded as JPEG.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::error::ArtError;
use crate::ports::EncodedImage;

/// Default bound for the long edge of an upload, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Default JPEG quality for re-encoded uploads.
pub const DEFAULT_QUALITY: u8 = 90;

/// Lowest quality tried when shrinking an upload to fit a byte budget.
const MIN_QUALITY: u8 = 40;
const QUALITY_STEP: u8 = 10;

const OUTPUT_MIME: &str = "image/jpeg";

/// Bounds dimensions and encoding of user images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    /// Maximum length of the long edge, in pixels.
    pub max_dimension: u32,
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Optional upper bound on the encoded size, in bytes.
    pub max_bytes: Option<usize>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self { max_dimension: DEFAULT_MAX_DIMENSION, quality: DEFAULT_QUALITY, max_bytes: None }
    }
}

impl Normalizer {
    /// Create a normalizer, validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidArgument`] for a zero dimension or a quality outside 1-100.
    pub fn new(max_dimension: u32, quality: u8, max_bytes: Option<usize>) -> Result<Self, ArtError> {
        if max_dimension == 0 {
            return Err(ArtError::InvalidArgument("Max dimension must be at least 1".into()));
        }
        if !(1..=100).contains(&quality) {
            return Err(ArtError::InvalidArgument(format!(
                "Unsupported quality '{quality}'. Valid: 1-100"
            )));
        }
        Ok(Self { max_dimension, quality, max_bytes })
    }

    /// Read a file from disk and normalize it.
    ///
    /// Files holding a `data:` URL (as exported by browsers) are unwrapped
    /// first; otherwise the extension provides the declared MIME type.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::Io`] if the file cannot be read, otherwise as
    /// [`Normalizer::normalize`].
    pub fn normalize_file(&self, path: &Path) -> Result<EncodedImage, ArtError> {
        let bytes = std::fs::read(path)?;
        if bytes.starts_with(b"data:") {
            let text = String::from_utf8_lossy(&bytes);
            let source = EncodedImage::from_data_url(text.trim()).map_err(ArtError::UnsupportedFormat)?;
            return self.normalize(&source.data, &source.mime_type);
        }
        self.normalize(&bytes, declared_mime_for(path))
    }

    /// Decode, bound, and re-encode image bytes.
    ///
    /// The format is detected from the content first; `declared_mime` is only
    /// consulted when the content is not recognised.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::UnsupportedFormat`] if the bytes cannot be decoded as an image.
    pub fn normalize(&self, bytes: &[u8], declared_mime: &str) -> Result<EncodedImage, ArtError> {
        let img = decode(bytes, declared_mime)?;
        let (width, height) = (img.width(), img.height());
        let (target_w, target_h) = fit_within(width, height, self.max_dimension);

        let img = if (target_w, target_h) == (width, height) {
            img
        } else {
            tracing::debug!("Resizing {width}x{height} to {target_w}x{target_h}");
            img.resize_exact(target_w, target_h, FilterType::Triangle)
        };

        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut quality = self.quality;
        let mut data = encode_jpeg(&rgb, quality)?;

        if let Some(limit) = self.max_bytes {
            while data.len() > limit && quality > MIN_QUALITY {
                quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
                tracing::debug!("Upload is {} bytes, retrying at quality {quality}", data.len());
                data = encode_jpeg(&rgb, quality)?;
            }
            if data.len() > limit {
                tracing::warn!(
                    "Upload is {} bytes, still above the {limit} byte budget at quality {quality}",
                    data.len()
                );
            }
        }

        tracing::debug!("Normalized upload: {target_w}x{target_h}, {} bytes", data.len());
        Ok(EncodedImage::new(OUTPUT_MIME, data))
    }
}

/// Dimensions that fit `width` x `height` within `max` on the long edge.
///
/// Images already within bounds keep their size. Larger images get a long edge
/// of exactly `max` and a proportionally rounded short edge of at least 1.
#[must_use]
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max || long == 0 {
        return (width, height);
    }
    let scale = |edge: u32| -> u32 {
        let scaled = (u64::from(edge) * u64::from(max) + u64::from(long) / 2) / u64::from(long);
        u32::try_from(scaled).unwrap_or(max).clamp(1, max)
    };
    if width >= height {
        (max, scale(height))
    } else {
        (scale(width), max)
    }
}

/// MIME type a file declares through its extension.
#[must_use]
pub fn declared_mime_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path).map_or("application/octet-stream", |f| f.to_mime_type())
}

fn decode(bytes: &[u8], declared_mime: &str) -> Result<DynamicImage, ArtError> {
    if bytes.is_empty() {
        return Err(ArtError::UnsupportedFormat("input is empty".into()));
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ArtError::UnsupportedFormat(e.to_string()))?;

    if reader.format().is_none() {
        let declared = ImageFormat::from_mime_type(declared_mime).ok_or_else(|| {
            ArtError::UnsupportedFormat(format!("unrecognised content (declared '{declared_mime}')"))
        })?;
        reader.set_format(declared);
    }

    let unsupported = |e: image::ImageError| ArtError::UnsupportedFormat(e.to_string());
    let mut decoder = reader.into_decoder().map_err(unsupported)?;
    // Camera photos store rotation as an EXIF tag; the JPEG we send carries none.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(unsupported)?;
    if orientation != Orientation::NoTransforms {
        tracing::debug!("Applying EXIF orientation {orientation:?}");
        img.apply_orientation(orientation);
    }
    Ok(img)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ArtError> {
    let mut data = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut data, quality))
        .map_err(|e| ArtError::ImageConversion(format!("Failed to encode JPEG: {e}")))?;
    Ok(data)
}
