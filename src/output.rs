//! File naming, image saving, and format conversion.

use std::path::{Path, PathBuf};

use crate::error::ArtError;
use crate::ports::EncodedImage;

/// Validate the output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    match format {
        "jpeg" | "png" | "webp" => Ok(()),
        _ => Err(format!("Unsupported format '{format}'. Valid: jpeg, png, webp")),
    }
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "webp" => "webp",
        _ => "jpg",
    }
}

/// Generate an output filename of the form `artiface-<unix millis>.<ext>`.
#[must_use]
pub fn auto_filename(format: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    format!("artiface-{millis}.{}", format_extension(format))
}

/// Resolve the output path: use explicit path or auto-generate.
#[must_use]
pub fn resolve_output_path(explicit: Option<&Path>, format: &str) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(auto_filename(format)), Path::to_path_buf)
}

/// Save an image to a file, converting format if necessary.
///
/// # Errors
///
/// Returns an error if the file cannot be written or format conversion fails.
pub fn save_image(
    image: &EncodedImage,
    target_format: &str,
    output_path: &Path,
) -> Result<(), ArtError> {
    if mime_matches_format(&image.mime_type, target_format) {
        std::fs::write(output_path, &image.data).map_err(ArtError::Io)
    } else {
        tracing::debug!("Converting {} to {target_format}", image.mime_type);
        convert_and_save(&image.data, target_format, output_path)
    }
}

fn mime_matches_format(mime: &str, format: &str) -> bool {
    matches!((mime, format), ("image/jpeg", "jpeg") | ("image/png", "png") | ("image/webp", "webp"))
}

fn convert_and_save(data: &[u8], target_format: &str, output_path: &Path) -> Result<(), ArtError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ArtError::ImageConversion(format!("Failed to decode image: {e}")))?;

    let (image_format, img) = match target_format {
        "jpeg" => (image::ImageFormat::Jpeg, image::DynamicImage::ImageRgb8(img.to_rgb8())),
        "png" => (image::ImageFormat::Png, img),
        "webp" => (image::ImageFormat::WebP, image::DynamicImage::ImageRgba8(img.to_rgba8())),
        other => {
            return Err(ArtError::ImageConversion(format!("Unsupported format: {other}")));
        }
    };

    img.save_with_format(output_path, image_format)
        .map_err(|e| ArtError::ImageConversion(format!("Failed to save as {target_format}: {e}")))
}
