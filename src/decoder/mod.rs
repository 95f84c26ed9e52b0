//! Image decoding
//!
//! Turns an uploaded blob into a [`DecodedSurface`]: an RGBA pixel grid
//! whose dimensions are fixed for the rest of the pipeline.
//!
//! # Media type handling
//!
//! The declared MIME type is checked once, here: anything outside `image/*`
//! is rejected before a single byte is parsed. The codec itself is sniffed
//! from the data, so a JPEG uploaded as `image/png` still decodes (the
//! mismatch is logged at debug level).
//!
//! # Example
//!
//! ```ignore
//! use watermarker::decoder::{ImageDecoder, SourceImage};
//!
//! let source = SourceImage::new(bytes, "image/png");
//! let surface = ImageDecoder::new().decode(source).await?;
//! println!("{}x{}", surface.width(), surface.height());
//! ```

pub mod error;
pub mod limits;

pub use error::DecodeError;
pub use limits::{validate_dimensions, validate_file_size, DecodeLimits};

use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Raw image bytes plus the MIME type the uploader claimed for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    data: Vec<u8>,
    declared_type: String,
}

impl SourceImage {
    pub fn new(data: impl Into<Vec<u8>>, declared_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            declared_type: declared_type.into(),
        }
    }

    /// Read a file, inferring the declared type from its extension.
    ///
    /// Unknown extensions are declared as `application/octet-stream`, which
    /// the decoder rejects.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let declared_type = mime_type_for_path(path).unwrap_or("application/octet-stream");
        Ok(Self::new(data, declared_type))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the declared type names an image kind
    pub fn is_image_type(&self) -> bool {
        normalize_media_type(&self.declared_type).starts_with("image/")
    }
}

/// Map a file extension to its image MIME type.
pub fn mime_type_for_path(path: impl AsRef<Path>) -> Option<&'static str> {
    ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type())
        .filter(|mime| mime.starts_with("image/"))
}

/// Strip parameters and case from a media type (`Image/PNG; q=1` -> `image/png`)
fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A decoded image, ready to be drawn on
pub struct DecodedSurface {
    pixels: RgbaImage,
    has_alpha: bool,
    source_format: Option<ImageFormat>,
}

impl std::fmt::Debug for DecodedSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedSurface")
            .field("dimensions", &(self.width(), self.height()))
            .field("has_alpha", &self.has_alpha)
            .field("source_format", &self.source_format)
            .finish()
    }
}

impl DecodedSurface {
    /// Wrap pixels that are already in memory. Fails on a zero-sized axis.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, DecodeError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let has_alpha = pixels.pixels().any(|p| p[3] != u8::MAX);
        Ok(Self {
            pixels,
            has_alpha,
            source_format: None,
        })
    }

    fn from_dynamic(image: DynamicImage, format: ImageFormat) -> Result<Self, DecodeError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let has_alpha = image.color().has_alpha();
        Ok(Self {
            pixels: image.into_rgba8(),
            has_alpha,
            source_format: Some(format),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether the source carried an alpha channel
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Codec the surface was decoded from, if it came from bytes
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }
}

/// Decodes source blobs into surfaces under a set of limits
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder {
    limits: DecodeLimits,
}

impl ImageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Decode on the blocking pool.
    ///
    /// Decoding a large JPEG takes tens of milliseconds of CPU; it runs in
    /// `spawn_blocking` so the calling task only suspends.
    pub async fn decode(&self, source: SourceImage) -> Result<DecodedSurface, DecodeError> {
        let limits = self.limits.clone();
        tokio::task::spawn_blocking(move || decode_source(&source, &limits))
            .await
            .map_err(|e| DecodeError::TaskFailed {
                message: e.to_string(),
            })?
    }

    /// Decode on the current thread.
    pub fn decode_blocking(&self, source: &SourceImage) -> Result<DecodedSurface, DecodeError> {
        decode_source(source, &self.limits)
    }
}

fn decode_source(source: &SourceImage, limits: &DecodeLimits) -> Result<DecodedSurface, DecodeError> {
    let declared = source.declared_type();

    if !source.is_image_type() {
        tracing::warn!(declared_type = %declared, "Rejected non-image upload");
        return Err(DecodeError::unsupported_media_type(declared));
    }

    validate_file_size(source.len(), limits)?;

    let format = ImageReader::new(Cursor::new(source.data()))
        .with_guessed_format()
        .map_err(|e| DecodeError::decode_failed(e.to_string()))?
        .format()
        .ok_or_else(|| DecodeError::UnsupportedFormat {
            declared_type: declared.to_string(),
        })?;

    if let Some(declared_format) = ImageFormat::from_mime_type(normalize_media_type(declared)) {
        if declared_format != format {
            tracing::debug!(
                declared_type = %declared,
                detected = ?format,
                "Declared type does not match image content, decoding as detected"
            );
        }
    }

    // Read only the header so oversized images are rejected before inflation
    let (width, height) = ImageReader::with_format(Cursor::new(source.data()), format)
        .into_dimensions()
        .map_err(|e| DecodeError::from_image_error(e, declared))?;
    validate_dimensions(width, height, limits)?;

    let image = ImageReader::with_format(Cursor::new(source.data()), format)
        .decode()
        .map_err(|e| DecodeError::from_image_error(e, declared))?;

    let surface = DecodedSurface::from_dynamic(image, format)?;

    tracing::debug!(
        width = surface.width(),
        height = surface.height(),
        format = ?format,
        has_alpha = surface.has_alpha(),
        bytes = source.len(),
        "Decoded source image"
    );

    Ok(surface)
}
