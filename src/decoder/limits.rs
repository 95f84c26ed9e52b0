//! Decode limits
//!
//! Guards against decompression bombs: a few hundred bytes of PNG can
//! declare a surface of several gigabytes. Dimensions are checked from the
//! image header before the pixel data is inflated.

use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Upper bounds applied to every decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeLimits {
    /// Maximum encoded input size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Maximum source image width
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,
    /// Maximum source image height
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
    /// Maximum total pixels (width * height)
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
            max_pixels: default_max_pixels(),
        }
    }
}

impl DecodeLimits {
    /// Limits that accept anything addressable. Intended for trusted inputs.
    pub fn unlimited() -> Self {
        Self {
            max_file_size: usize::MAX,
            max_width: u32::MAX,
            max_height: u32::MAX,
            max_pixels: u64::MAX,
        }
    }
}

fn default_max_file_size() -> usize {
    50 * 1024 * 1024 // 50MB
}

fn default_max_dimension() -> u32 {
    16384
}

fn default_max_pixels() -> u64 {
    100_000_000 // 100 megapixels
}

/// Validate image dimensions against the limits
pub fn validate_dimensions(
    width: u32,
    height: u32,
    limits: &DecodeLimits,
) -> Result<(), DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    let pixels = width as u64 * height as u64;

    if width > limits.max_width || height > limits.max_height || pixels > limits.max_pixels {
        return Err(DecodeError::ImageTooLarge {
            width,
            height,
            pixels,
            max_pixels: limits.max_pixels,
        });
    }

    Ok(())
}

/// Validate encoded input size
pub fn validate_file_size(size: usize, limits: &DecodeLimits) -> Result<(), DecodeError> {
    if size > limits.max_file_size {
        return Err(DecodeError::FileTooLarge {
            size,
            max_size: limits.max_file_size,
        });
    }
    Ok(())
}
