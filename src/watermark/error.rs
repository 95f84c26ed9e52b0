//! Watermark error types.
//!
//! Defines errors that can occur while styling and compositing a watermark.

use thiserror::Error;

use crate::decoder::DecodeError;

/// Errors that can occur during watermark compositing.
///
/// All of them fail the whole call: no partially drawn canvas is ever
/// handed back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositeError {
    /// The source never became a surface
    #[error("Failed to decode source image: {0}")]
    Decode(#[from] DecodeError),

    /// Output canvas or layer buffer could not be allocated
    #[error("Failed to allocate {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },

    /// Embedded font could not be parsed
    #[error("Watermark font unavailable: {0}")]
    FontUnavailable(String),

    /// PNG serialization failed
    #[error("Failed to encode watermarked image: {0}")]
    EncodeFailed(String),
}

/// Errors in watermark style settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    /// Color string is not #RGB or #RRGGBB
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Theme name does not match a preset
    #[error("Unknown watermark theme: {0}")]
    UnknownTheme(String),
}

impl CompositeError {
    /// Whether re-running the same call can succeed once the environment
    /// recovers. Decode failures need new input instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Decode(err) => err.is_retryable(),
            Self::CanvasAllocation { .. } | Self::EncodeFailed(_) => true,
            Self::FontUnavailable(_) => false,
        }
    }
}
