//! PNG export of a composited canvas.

use super::CompositeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use std::path::Path;

/// File name used when saving a watermarked image without an explicit path.
pub const DEFAULT_OUTPUT_FILENAME: &str = "watermarked-image.png";

/// Content type of every composited image.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// A watermarked image, encoded as PNG
#[derive(Clone, PartialEq, Eq)]
pub struct CompositedImage {
    /// The encoded PNG data
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for CompositedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositedImage")
            .field("dimensions", &(self.width, self.height))
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl CompositedImage {
    pub fn content_type(&self) -> &'static str {
        PNG_CONTENT_TYPE
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:image/png;base64,...` URL for embedding or download links.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", PNG_CONTENT_TYPE, STANDARD.encode(&self.data))
    }

    /// Write the PNG bytes to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.data)
    }
}

/// Drop the alpha channel from RGBA data
fn rgba_to_rgb(rgba: &[u8]) -> Result<Vec<u8>, std::collections::TryReserveError> {
    let mut rgb = Vec::new();
    rgb.try_reserve_exact(rgba.len() / 4 * 3)?;
    for chunk in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&chunk[..3]);
    }
    Ok(rgb)
}

/// Encode a canvas as PNG. `keep_alpha` selects RGBA8 over RGB8 output.
pub fn encode_png(canvas: &RgbaImage, keep_alpha: bool) -> Result<CompositedImage, CompositeError> {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder as _};
    use std::io::Cursor;

    let (width, height) = canvas.dimensions();
    let mut output = Cursor::new(Vec::new());
    let encoder = PngEncoder::new(&mut output);

    let result = if keep_alpha {
        encoder.write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
    } else {
        let rgb = rgba_to_rgb(canvas.as_raw())
            .map_err(|_| CompositeError::CanvasAllocation { width, height })?;
        encoder.write_image(&rgb, width, height, ExtendedColorType::Rgb8)
    };
    result.map_err(|e| CompositeError::EncodeFailed(e.to_string()))?;

    Ok(CompositedImage {
        data: output.into_inner(),
        width,
        height,
    })
}
