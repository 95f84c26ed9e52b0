//! Watermark compositor for burning text into decoded images.
//!
//! Each paint operation is a [`WatermarkLayer`]: a coverage mask in canvas
//! coordinates plus the color and opacity it is painted with. Layers are
//! blended with the Porter-Duff "over" operator in the order they were added.
//!
//! # Layer order
//!
//! 1. Drop shadow of the text silhouette
//! 2. Outline stroke
//! 3. Fill
//!
//! # Example
//!
//! ```ignore
//! use watermarker::decoder::{ImageDecoder, SourceImage};
//! use watermarker::watermark::WatermarkCompositor;
//!
//! let surface = ImageDecoder::new().decode(source).await?;
//! let png = WatermarkCompositor::new().composite(&surface, "SAMPLE")?;
//! ```

use super::effects::{drop_shadow, effect_margin, silhouette, stroke_band};
use super::encoder::{encode_png, CompositedImage};
use super::style::{Paint, StyleParams, WatermarkStyle};
use super::text_renderer::{render_line, CoverageMask, TextLayout};
use super::CompositeError;
use crate::decoder::{DecodedSurface, ImageDecoder, SourceImage};
use image::{Rgba, RgbaImage};
use std::time::Instant;
use tracing::{debug, info};

/// A single paint operation to be composited onto the canvas.
#[derive(Debug, Clone)]
pub struct WatermarkLayer {
    /// Where and how strongly to paint
    pub coverage: CoverageMask,
    /// Color and opacity, multiplied by the coverage
    pub paint: Paint,
}

/// Compositor for applying layers to a canvas.
#[derive(Debug, Default)]
pub struct Compositor {
    layers: Vec<WatermarkLayer>,
}

impl Compositor {
    /// Create a new compositor with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer on top of the existing ones.
    pub fn add_layer(&mut self, layer: WatermarkLayer) {
        self.layers.push(layer);
    }

    /// Apply all layers to the target image.
    ///
    /// Layers are applied in the order they were added.
    pub fn apply(&self, target: &mut RgbaImage) {
        for layer in &self.layers {
            blend_layer(target, layer);
        }
    }

    /// Get the number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[WatermarkLayer] {
        &self.layers
    }

    /// Clear all layers.
    pub fn clear(&mut self) {
        self.layers.clear();
    }
}

/// Blend a single layer onto the target image.
fn blend_layer(target: &mut RgbaImage, layer: &WatermarkLayer) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let mask = &layer.coverage.mask;
    let origin_x = layer.coverage.x as i64;
    let origin_y = layer.coverage.y as i64;

    // Calculate the visible region (clamp to target bounds)
    let x_start = origin_x.max(0);
    let y_start = origin_y.max(0);
    let x_end = (origin_x + mask.width() as i64).min(target_width);
    let y_end = (origin_y + mask.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let coverage = mask.get_pixel((tx - origin_x) as u32, (ty - origin_y) as u32)[0];
            if coverage == 0 {
                continue;
            }

            let pixel = target.get_pixel_mut(tx as u32, ty as u32);
            *pixel = blend_pixels(*pixel, layer.paint, coverage);
        }
    }
}

/// Blend paint over a pixel, scaled by mask coverage.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
fn blend_pixels(background: Rgba<u8>, paint: Paint, coverage: u8) -> Rgba<u8> {
    let fg_alpha = (coverage as f32 / 255.0) * paint.opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    // Porter-Duff "over" operator
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return background;
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    let color = paint.color;
    Rgba([
        blend_channel(color.r, background[0]),
        blend_channel(color.g, background[1]),
        blend_channel(color.b, background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Copy the surface pixels into a fresh canvas.
fn alloc_canvas(surface: &DecodedSurface) -> Result<RgbaImage, CompositeError> {
    let (width, height) = surface.dimensions();
    let failed = || CompositeError::CanvasAllocation { width, height };

    let raw = surface.pixels().as_raw();
    let mut buf = Vec::new();
    buf.try_reserve_exact(raw.len()).map_err(|_| failed())?;
    buf.extend_from_slice(raw);

    RgbaImage::from_raw(width, height, buf).ok_or_else(failed)
}

/// Build the shadow, outline and fill layers for one line of text.
pub fn build_text_layers(
    text: &str,
    style: &WatermarkStyle,
    params: &StyleParams,
    canvas: (u32, u32),
) -> Result<Compositor, CompositeError> {
    let mut compositor = Compositor::new();

    let stroke_width = style.stroke.map(|_| params.stroke_width);
    let margin = effect_margin(
        stroke_width,
        style.shadow.map(|s| (s.offset_x, s.offset_y, s.blur)),
    );
    let layout = TextLayout::new(
        params.font_size,
        style.font_weight,
        params.anchor_x,
        params.anchor_y,
    );

    let Some(glyphs) = render_line(text, &layout, margin, canvas)? else {
        return Ok(compositor);
    };
    if glyphs.is_blank() {
        return Ok(compositor);
    }

    if let Some(shadow) = style.shadow {
        let shape = silhouette(&glyphs, stroke_width)?;
        compositor.add_layer(WatermarkLayer {
            coverage: drop_shadow(&shape, shadow.offset_x, shadow.offset_y, shadow.blur),
            paint: shadow.paint,
        });
    }

    if let (Some(paint), Some(width)) = (style.stroke, stroke_width) {
        if width > 0.0 {
            compositor.add_layer(WatermarkLayer {
                coverage: stroke_band(&glyphs, width)?,
                paint,
            });
        }
    }

    compositor.add_layer(WatermarkLayer {
        coverage: glyphs,
        paint: style.fill,
    });

    Ok(compositor)
}

/// Burns a single line of text into decoded images.
#[derive(Debug, Clone, Default)]
pub struct WatermarkCompositor {
    style: WatermarkStyle,
}

impl WatermarkCompositor {
    /// Compositor with the default high-contrast style.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: WatermarkStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &WatermarkStyle {
        &self.style
    }

    /// Draw `text` onto a copy of `surface` and encode the result as PNG.
    ///
    /// The output has the surface's dimensions. Empty or whitespace-only text
    /// produces the surface pixels unchanged. Fails without partial output.
    pub fn composite(
        &self,
        surface: &DecodedSurface,
        text: &str,
    ) -> Result<CompositedImage, CompositeError> {
        let start = Instant::now();
        let (width, height) = surface.dimensions();

        let params = self.style.derive(width, height);
        debug!(
            width = width,
            height = height,
            font_size = params.font_size,
            font_weight = self.style.font_weight.css_weight(),
            stroke_width = params.stroke_width,
            padding = params.padding,
            anchor_x = params.anchor_x,
            anchor_y = params.anchor_y,
            "Derived watermark parameters"
        );

        let mut canvas = alloc_canvas(surface)?;
        let layers = build_text_layers(text, &self.style, &params, (width, height))?;
        layers.apply(&mut canvas);

        let image = encode_png(&canvas, surface.has_alpha())?;

        info!(
            width = width,
            height = height,
            layers = layers.layer_count(),
            bytes = image.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Watermark composited"
        );

        Ok(image)
    }
}

/// Decode `source`, then composite `text` onto it.
pub async fn composite_source(
    decoder: &ImageDecoder,
    compositor: &WatermarkCompositor,
    source: SourceImage,
    text: &str,
) -> Result<CompositedImage, CompositeError> {
    let surface = decoder.decode(source).await?;
    compositor.composite(&surface, text)
}
