//! Image encoding for saved selections
//!
//! Encodes an `ImageBuffer` as PNG, JPEG or WebP. The format is picked from
//! the output file extension, falling back to PNG.
//!
//! - **PNG**: lossless; the quality value picks the compression level
//! - **JPEG**: lossy with quality 1-100; the alpha channel is dropped
//! - **WebP**: lossless only in image crate v0.25 (quality ignored)
//!
//! # Examples
//!
//! ```
//! use scrot_select::{
//!     capture::ImageBuffer,
//!     util::encode::{OutputFormat, encode_image},
//! };
//!
//! let img = ImageBuffer::from_test_pattern(64, 64);
//! let png_bytes = encode_image(&img, OutputFormat::Png, 75).unwrap();
//! assert_eq!(&png_bytes[1..4], b"PNG");
//! ```

use std::{io::Cursor, path::Path};

use image::{
    ImageEncoder,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
        webp::WebPEncoder,
    },
};

use crate::{
    capture::ImageBuffer,
    error::{SelectionError, SelectionResult},
};

/// Default quality, matching the classic screenshot tool default
pub const DEFAULT_QUALITY: u8 = 75;

/// Encoded output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    /// Format implied by a file extension; unknown extensions give PNG
    ///
    /// # Examples
    ///
    /// ```
    /// use scrot_select::util::encode::OutputFormat;
    ///
    /// assert_eq!(OutputFormat::from_path("shot.JPG"), OutputFormat::Jpeg);
    /// assert_eq!(OutputFormat::from_path("shot"), OutputFormat::Png);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("jpg" | "jpeg") => OutputFormat::Jpeg,
            Some("webp") => OutputFormat::Webp,
            _ => OutputFormat::Png,
        }
    }
}

/// Maps a quality value (0-100) to a PNG compression type
///
/// - 0-33: Fast compression
/// - 34-66: Default compression
/// - 67-100: Best compression
pub fn compression_type_from_quality(quality: u8) -> CompressionType {
    match quality {
        0..=33 => CompressionType::Fast,
        34..=66 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn encoding_failed(format: &str, e: image::ImageError) -> SelectionError {
    SelectionError::ImageError(format!("{} encoding failed: {}", format, e))
}

/// Encodes an image as PNG with the given compression level
pub fn encode_png(buffer: &ImageBuffer, compression: CompressionType) -> SelectionResult<Vec<u8>> {
    let mut output = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(Cursor::new(&mut output), compression, FilterType::Adaptive);

    let (width, height) = buffer.dimensions();
    encoder
        .write_image(buffer.inner().as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| encoding_failed("png", e))?;

    Ok(output)
}

/// Encodes an image as JPEG; quality is clamped to 1-100
pub fn encode_jpeg(buffer: &ImageBuffer, quality: u8) -> SelectionResult<Vec<u8>> {
    let quality = quality.clamp(1, 100);

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgba8(buffer.inner().clone()).to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(SelectionError::ImageError(
            "Image dimensions must be > 0".to_string(),
        ));
    }

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut output), quality)
        .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| encoding_failed("jpeg", e))?;

    Ok(output)
}

/// Encodes an image as lossless WebP
pub fn encode_webp(buffer: &ImageBuffer) -> SelectionResult<Vec<u8>> {
    let mut output = Vec::new();
    let (width, height) = buffer.dimensions();
    WebPEncoder::new_lossless(Cursor::new(&mut output))
        .write_image(buffer.inner().as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| encoding_failed("webp", e))?;

    Ok(output)
}

/// Encodes an image in the given format
pub fn encode_image(
    buffer: &ImageBuffer,
    format: OutputFormat,
    quality: u8,
) -> SelectionResult<Vec<u8>> {
    match format {
        OutputFormat::Png => encode_png(buffer, compression_type_from_quality(quality)),
        OutputFormat::Jpeg => encode_jpeg(buffer, quality),
        OutputFormat::Webp => encode_webp(buffer),
    }
}

/// Encodes an image by the extension of `path` and writes it there
pub fn save_image(buffer: &ImageBuffer, path: &Path, quality: u8) -> SelectionResult<()> {
    let format = OutputFormat::from_path(path);
    let bytes = encode_image(buffer, format, quality)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!("Wrote {} bytes of {:?} to {}", bytes.len(), format, path.display());
    Ok(())
}
