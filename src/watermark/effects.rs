//! Contrast effects built from a text coverage mask.
//!
//! Outlines are morphological: the band between a dilated and an eroded copy
//! of the glyph mask (imageproc disk masks), so the stroke straddles the
//! outline. Shadows are a gaussian blur of the text silhouette, shifted by
//! the shadow offset.

use super::text_renderer::CoverageMask;
use super::CompositeError;
use image::GrayImage;
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

/// Allocate a zeroed mask, reporting allocation failure instead of aborting.
pub(crate) fn alloc_mask(width: u32, height: u32) -> Result<GrayImage, CompositeError> {
    let failed = || CompositeError::CanvasAllocation { width, height };

    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(failed)?;

    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| failed())?;
    buf.resize(len, 0u8);

    GrayImage::from_raw(width, height, buf).ok_or_else(failed)
}

/// Gaussian sigma for a canvas-style blur radius.
pub fn blur_sigma(blur: f32) -> f32 {
    (blur / 2.0).max(0.0)
}

/// Empty border a text mask needs so outline and shadow never touch its edge.
pub fn effect_margin(stroke_width: Option<f32>, shadow: Option<(i32, i32, f32)>) -> u32 {
    let stroke = stroke_width
        .map(|w| (w / 2.0 + 1.0).ceil() as u32)
        .unwrap_or(0);

    let shadow = shadow
        .map(|(dx, dy, blur)| {
            let spread = (2.0 * blur_sigma(blur)).ceil() as u32 + 1;
            spread + dx.unsigned_abs().max(dy.unsigned_abs())
        })
        .unwrap_or(0);

    stroke + shadow + 2
}

/// Largest radius whose next whole radius still fits a disk mask.
const MAX_MASK_RADIUS: f32 = (u8::MAX - 1) as f32;

/// Apply a disk-shaped morphology operation with a fractional radius.
///
/// Disk masks only come in whole pixels, so the result is interpolated
/// between the neighboring integer radii.
fn disk_morphology(
    mask: &GrayImage,
    radius: f32,
    op: fn(&GrayImage, &Mask) -> GrayImage,
) -> Result<GrayImage, CompositeError> {
    let (width, height) = mask.dimensions();
    let mut out = alloc_mask(width, height)?;

    let radius = radius.clamp(0.0, MAX_MASK_RADIUS);
    let lower = radius.floor();
    let frac = radius - lower;

    let inner = if lower >= 1.0 {
        op(mask, &Mask::disk(lower as u8))
    } else {
        mask.clone()
    };
    if frac <= f32::EPSILON {
        out.copy_from_slice(inner.as_raw());
        return Ok(out);
    }

    let outer = op(mask, &Mask::disk(lower as u8 + 1));
    for ((o, a), b) in out.iter_mut().zip(inner.iter()).zip(outer.iter()) {
        *o = (*a as f32 + (*b as f32 - *a as f32) * frac).round() as u8;
    }

    Ok(out)
}

/// Grow coverage by `radius` pixels.
pub fn dilate(mask: &GrayImage, radius: f32) -> Result<GrayImage, CompositeError> {
    disk_morphology(mask, radius, grayscale_dilate)
}

/// Shrink coverage by `radius` pixels.
pub fn erode(mask: &GrayImage, radius: f32) -> Result<GrayImage, CompositeError> {
    disk_morphology(mask, radius, grayscale_erode)
}

/// Outline band of `width` pixels centered on the glyph edges.
pub fn stroke_band(text: &CoverageMask, width: f32) -> Result<CoverageMask, CompositeError> {
    let radius = width / 2.0;
    let outer = dilate(&text.mask, radius)?;
    let inner = erode(&text.mask, radius)?;

    let mut band = outer;
    for (o, i) in band.iter_mut().zip(inner.iter()) {
        *o = o.saturating_sub(*i);
    }

    Ok(CoverageMask {
        mask: band,
        x: text.x,
        y: text.y,
    })
}

/// Everything the text paints: the glyphs plus the outer half of the stroke.
pub fn silhouette(
    text: &CoverageMask,
    stroke_width: Option<f32>,
) -> Result<CoverageMask, CompositeError> {
    let mask = match stroke_width {
        Some(width) if width > 0.0 => dilate(&text.mask, width / 2.0)?,
        _ => text.mask.clone(),
    };

    Ok(CoverageMask {
        mask,
        x: text.x,
        y: text.y,
    })
}

/// Blurred, offset copy of a silhouette.
pub fn drop_shadow(silhouette: &CoverageMask, offset_x: i32, offset_y: i32, blur: f32) -> CoverageMask {
    let sigma = blur_sigma(blur);
    let mask = if sigma > 0.0 {
        image::imageops::blur(&silhouette.mask, sigma)
    } else {
        silhouette.mask.clone()
    };

    CoverageMask {
        mask,
        x: silhouette.x + offset_x,
        y: silhouette.y + offset_y,
    }
}
