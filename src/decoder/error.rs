//! Decode error types
//!
//! Every way an uploaded blob can fail to become a pixel surface. None of
//! these are retryable with the same input: the caller has to ask for a
//! different file.

use thiserror::Error;

/// Errors that can occur while turning a source blob into a surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Declared MIME type is not an `image/*` type
    #[error("Unsupported media type: {declared_type}")]
    UnsupportedMediaType { declared_type: String },

    /// Bytes are not in any codec this build can read
    #[error("Unsupported image format (declared as {declared_type})")]
    UnsupportedFormat { declared_type: String },

    /// Codec recognised but the data is corrupt or truncated
    #[error("Failed to decode image: {message}")]
    DecodeFailed { message: String },

    /// Decoded image has a zero-sized axis
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Image dimensions exceed the configured limits (image bomb protection)
    #[error("Image dimensions {width}x{height} ({pixels} pixels) exceed limit of {max_pixels} pixels")]
    ImageTooLarge {
        width: u32,
        height: u32,
        pixels: u64,
        max_pixels: u64,
    },

    /// Encoded input exceeds the configured size limit
    #[error("File size {size} bytes exceeds maximum {max_size} bytes")]
    FileTooLarge { size: usize, max_size: usize },

    /// The blocking decode task panicked or was cancelled
    #[error("Decode task failed: {message}")]
    TaskFailed { message: String },
}

impl DecodeError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        DecodeError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn unsupported_media_type(declared_type: impl Into<String>) -> Self {
        DecodeError::UnsupportedMediaType {
            declared_type: declared_type.into(),
        }
    }

    /// Map an `image` crate error onto the decode taxonomy.
    pub(crate) fn from_image_error(err: image::ImageError, declared_type: &str) -> Self {
        match err {
            image::ImageError::Unsupported(_) => DecodeError::UnsupportedFormat {
                declared_type: declared_type.to_string(),
            },
            other => DecodeError::decode_failed(other.to_string()),
        }
    }

    /// Decode failures are tied to the input; re-running with the same bytes
    /// fails the same way. Only a failed worker task is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DecodeError::TaskFailed { .. })
    }
}
