//! Watermark module for burning a line of text into decoded images.
//!
//! The compositor derives every size from the image dimensions, so the same
//! style reads well on a thumbnail and on a 4K photo.
//!
//! # Features
//!
//! - **Adaptive sizing**: font size, outline width and padding scale with the
//!   image, with a minimum font size
//! - **Contrast layering**: drop shadow, then outline, then fill
//! - **Theme presets**: contrast (default), classic, indigo and minimal
//! - **PNG export**: raw bytes, a data URL or a file
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   theme: contrast
//!   default_text: "Sua Marca d'Água"
//!   fill_color: "#FFFFFF"
//!   fill_opacity: 0.85
//! ```
//!
//! # Layout
//!
//! For a `width` x `height` image with the default theme:
//! - `font_size = max(16, min(width / 18, height / 22))`
//! - `stroke_width = font_size / 15`
//! - `padding = font_size * 0.75`
//! - the line is centered on `width / 2` with its descender line on
//!   `height - padding`

pub mod compositor;
pub mod effects;
pub mod encoder;
pub mod error;
pub mod style;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{
    build_text_layers, composite_source, Compositor, WatermarkCompositor, WatermarkLayer,
};
pub use encoder::{encode_png, CompositedImage, DEFAULT_OUTPUT_FILENAME, PNG_CONTENT_TYPE};
pub use error::{CompositeError, WatermarkError};
pub use style::{
    parse_hex_color, Color, FontWeight, Paint, ShadowStyle, StyleParams, WatermarkStyle,
    WatermarkTheme,
};
pub use text_renderer::{measure_text, render_line, CoverageMask, TextLayout, TextMetrics};
