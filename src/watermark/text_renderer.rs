//! Text watermark rendering.
//!
//! This module rasterizes a single line of text into a coverage mask placed
//! in canvas coordinates. Paint is applied later by the compositor, so the
//! same mask feeds the shadow, outline and fill layers.
//!
//! # Layout
//!
//! - Horizontally centered on `anchor_x`
//! - Bottom baseline: the font's descender line sits on `anchor_y`
//! - No wrapping; whitespace (including newlines) renders as plain spaces
//! - Parts of the line outside the canvas are clipped, never allocated
//!
//! # Example
//!
//! ```ignore
//! use watermarker::watermark::text_renderer::{render_line, TextLayout};
//!
//! let layout = TextLayout::new(27.0, FontWeight::Bold, 400.0, 579.5);
//! let mask = render_line("SAMPLE", &layout, 12, (800, 600))?;
//! ```

use super::effects::{alloc_mask, dilate};
use super::style::FontWeight;
use super::CompositeError;
use ab_glyph::{Font, FontRef, GlyphId, OutlinedGlyph, PxScale, Rect, ScaleFont};
use image::GrayImage;
use std::sync::OnceLock;

static REGULAR_FONT: OnceLock<Result<FontRef<'static>, String>> = OnceLock::new();
static BOLD_FONT: OnceLock<Result<FontRef<'static>, String>> = OnceLock::new();

/// Embedded font data (DejaVu Sans, Bitstream Vera license).
const REGULAR_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");
const BOLD_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

/// Get the embedded font for a weight, parsing it on first use.
pub fn font_for(weight: FontWeight) -> Result<&'static FontRef<'static>, CompositeError> {
    let (cell, data) = match weight {
        FontWeight::Regular | FontWeight::SemiBold => (&REGULAR_FONT, REGULAR_FONT_DATA),
        FontWeight::Bold => (&BOLD_FONT, BOLD_FONT_DATA),
    };

    cell.get_or_init(|| FontRef::try_from_slice(data).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| CompositeError::FontUnavailable(e.clone()))
}

/// Scale for a CSS-style font size, where `font_size` is the em height.
///
/// `PxScale` sets ascent-to-descent height instead, which for DejaVu is
/// about 1.16 em.
fn em_scale(font: &FontRef<'static>, font_size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(font_size * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(font_size),
    }
}

/// Horizontal and vertical extent of a line of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Sum of advances and kerning
    pub width: f32,
    /// Distance from baseline to the top of the em box (positive)
    pub ascent: f32,
    /// Distance from baseline to the descender line (negative)
    pub descent: f32,
}

impl TextMetrics {
    pub fn height(&self) -> f32 {
        self.ascent - self.descent
    }
}

/// Where and how big to draw a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub font_size: f32,
    pub weight: FontWeight,
    pub anchor_x: f32,
    pub anchor_y: f32,
}

impl TextLayout {
    pub fn new(font_size: f32, weight: FontWeight, anchor_x: f32, anchor_y: f32) -> Self {
        Self {
            font_size,
            weight,
            anchor_x,
            anchor_y,
        }
    }
}

/// Coverage (0..=255) of a layer, positioned on the canvas.
#[derive(Clone)]
pub struct CoverageMask {
    pub mask: GrayImage,
    /// Canvas x of the mask's left column
    pub x: i32,
    /// Canvas y of the mask's top row
    pub y: i32,
}

impl std::fmt::Debug for CoverageMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageMask")
            .field("dimensions", &(self.mask.width(), self.mask.height()))
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl CoverageMask {
    /// Whether any pixel has coverage
    pub fn is_blank(&self) -> bool {
        self.mask.as_raw().iter().all(|&c| c == 0)
    }

    /// The same mask shifted on the canvas
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            mask: self.mask.clone(),
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Canvas text rendering treats every whitespace character as a space.
fn normalize_char(c: char) -> char {
    if c.is_whitespace() {
        ' '
    } else {
        c
    }
}

/// Calculate the extent of rendered text.
pub fn measure_text(
    text: &str,
    font_size: f32,
    weight: FontWeight,
) -> Result<TextMetrics, CompositeError> {
    let font = font_for(weight)?;
    let scaled_font = font.as_scaled(em_scale(font, font_size));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars().map(normalize_char) {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }

        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    Ok(TextMetrics {
        width,
        ascent: scaled_font.ascent(),
        descent: scaled_font.descent(),
    })
}

/// Rasterize one line of text into a coverage mask.
///
/// The mask spans the union of the em box and the glyphs' ink, so marks
/// reaching above the ascent (stacked diacritics) are never cut. `margin`
/// pixels of empty border are kept around it so outline and blur passes have
/// room to spread. The mask never extends more than `margin` pixels past the
/// `canvas` bounds.
///
/// Returns `None` for empty text or a line that lies wholly off canvas.
pub fn render_line(
    text: &str,
    layout: &TextLayout,
    margin: u32,
    canvas: (u32, u32),
) -> Result<Option<CoverageMask>, CompositeError> {
    if text.is_empty() {
        return Ok(None);
    }

    let font = font_for(layout.weight)?;
    let scale = em_scale(font, layout.font_size);
    let scaled_font = font.as_scaled(scale);

    let metrics = measure_text(text, layout.font_size, layout.weight)?;
    let left = layout.anchor_x - metrics.width / 2.0;
    let baseline_y = layout.anchor_y + metrics.descent;

    // Outline every glyph in canvas coordinates
    let mut outlines: Vec<OutlinedGlyph> = Vec::new();
    let mut extent = Rect {
        min: ab_glyph::point(left, baseline_y - metrics.ascent),
        max: ab_glyph::point(left + metrics.width, layout.anchor_y),
    };
    let mut cursor_x = left;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars().map(normalize_char) {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            extent.min.x = extent.min.x.min(bounds.min.x);
            extent.min.y = extent.min.y.min(bounds.min.y);
            extent.max.x = extent.max.x.max(bounds.max.x);
            extent.max.y = extent.max.y.max(bounds.max.y);
            outlines.push(outlined);
        }
    }

    let embolden = layout.weight.embolden_radius(layout.font_size);
    let pad = margin as i32 + embolden.ceil() as i32;
    let limit_x = canvas.0 as i32 + margin as i32;
    let limit_y = canvas.1 as i32 + margin as i32;
    let x0 = (extent.min.x.floor() as i32 - pad).max(-(margin as i32));
    let x1 = (extent.max.x.ceil() as i32 + pad + 1).min(limit_x);
    let y0 = (extent.min.y.floor() as i32 - pad).max(-(margin as i32));
    let y1 = (extent.max.y.ceil() as i32 + pad + 1).min(limit_y);

    if x1 <= x0 || y1 <= y0 {
        return Ok(None);
    }

    let mask_width = (x1 - x0) as u32;
    let mask_height = (y1 - y0) as u32;
    let mut mask = alloc_mask(mask_width, mask_height)?;

    for outlined in &outlines {
        let bounds = outlined.px_bounds();
        if bounds.max.x < x0 as f32 || bounds.min.x > x1 as f32 {
            continue;
        }

        // px_bounds are whole pixels
        let origin_x = bounds.min.x as i32 - x0;
        let origin_y = bounds.min.y as i32 - y0;

        outlined.draw(|px, py, coverage| {
            let x = origin_x + px as i32;
            let y = origin_y + py as i32;

            if x >= 0 && y >= 0 && x < mask_width as i32 && y < mask_height as i32 {
                let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                let pixel = mask.get_pixel_mut(x as u32, y as u32);
                // Overlapping glyphs (kerned pairs) keep the stronger coverage
                pixel[0] = pixel[0].max(value);
            }
        });
    }

    if embolden > 0.0 {
        mask = dilate(&mask, embolden)?;
    }

    Ok(Some(CoverageMask { mask, x: x0, y: y0 }))
}
