//! Watermark styling.
//!
//! A [`WatermarkStyle`] bundles every constant the compositor needs: how the
//! font size scales with the image, the paint of each contrast layer and
//! which layers are drawn at all. The four [`WatermarkTheme`] presets cover
//! the product skins; everything else is derived per image by
//! [`WatermarkStyle::derive`].
//!
//! # Derivation
//!
//! ```text
//! font_size    = max(min_font_size, min(width / width_divisor, height / height_divisor))
//! stroke_width = font_size / stroke_divisor
//! padding      = font_size * padding_ratio
//! anchor       = (width / 2, height - padding)
//! ```

use serde::{Deserialize, Serialize};

use super::WatermarkError;

/// Parsed RGB color from hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
///
/// let red = parse_hex_color("#FF0000").unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::InvalidColor("Color must start with '#'".to_string()))?;

    if !hex.is_ascii() {
        return Err(WatermarkError::InvalidColor(
            "Invalid hex digit".to_string(),
        ));
    }

    let digit = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| WatermarkError::InvalidColor("Invalid hex digit".to_string()))
    };

    match hex.len() {
        // #RGB: double each digit, 0xF -> 0xFF
        3 => Ok(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Ok(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => Err(WatermarkError::InvalidColor(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            hex.len()
        ))),
    }
}

/// A color with an opacity, used for every drawn layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    /// Opacity (0.0 to 1.0).
    pub opacity: f32,
}

impl Paint {
    pub const fn new(color: Color, opacity: f32) -> Self {
        Self { color, opacity }
    }
}

/// Font weight of the rendered text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// 400
    Regular,
    /// 600, the regular face with synthetic emboldening
    SemiBold,
    /// 700
    #[default]
    Bold,
}

impl FontWeight {
    /// Stem growth per side for synthetic weights, as a fraction of the em
    const SEMIBOLD_EMBOLDEN: f32 = 0.014;

    /// Numeric CSS weight
    pub fn css_weight(self) -> u16 {
        match self {
            Self::Regular => 400,
            Self::SemiBold => 600,
            Self::Bold => 700,
        }
    }

    /// Pixels added on each side of every stroke at `font_size`.
    ///
    /// Zero for weights that have their own face.
    pub fn embolden_radius(self, font_size: f32) -> f32 {
        match self {
            Self::SemiBold => (font_size * Self::SEMIBOLD_EMBOLDEN).max(0.0),
            Self::Regular | Self::Bold => 0.0,
        }
    }
}

/// Drop shadow cast by the text silhouette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub offset_x: i32,
    pub offset_y: i32,
    /// Blur radius in pixels. The gaussian sigma is half of it.
    pub blur: f32,
    pub paint: Paint,
}

/// Named style presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkTheme {
    /// White fill, black outline and soft shadow
    #[default]
    Contrast,
    /// Shadow only, smaller and more transparent text
    Classic,
    /// Pale indigo fill with a deep indigo outline
    Indigo,
    /// Outline without shadow, regular weight
    Minimal,
}

impl WatermarkTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contrast => "contrast",
            Self::Classic => "classic",
            Self::Indigo => "indigo",
            Self::Minimal => "minimal",
        }
    }
}

impl std::str::FromStr for WatermarkTheme {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contrast" => Ok(Self::Contrast),
            "classic" => Ok(Self::Classic),
            "indigo" => Ok(Self::Indigo),
            "minimal" => Ok(Self::Minimal),
            other => Err(WatermarkError::UnknownTheme(other.to_string())),
        }
    }
}

/// Every constant that shapes the watermark
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    /// Floor for the derived font size, in pixels
    pub min_font_size: f32,
    pub width_divisor: f32,
    pub height_divisor: f32,
    /// stroke_width = font_size / stroke_divisor
    pub stroke_divisor: f32,
    /// padding = font_size * padding_ratio
    pub padding_ratio: f32,
    pub font_weight: FontWeight,
    pub fill: Paint,
    pub stroke: Option<Paint>,
    pub shadow: Option<ShadowStyle>,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self::from_theme(WatermarkTheme::default())
    }
}

impl WatermarkStyle {
    pub fn from_theme(theme: WatermarkTheme) -> Self {
        let black_shadow = ShadowStyle {
            offset_x: 2,
            offset_y: 2,
            blur: 8.0,
            paint: Paint::new(Color::black(), 0.6),
        };

        match theme {
            WatermarkTheme::Contrast => Self {
                min_font_size: 16.0,
                width_divisor: 18.0,
                height_divisor: 22.0,
                stroke_divisor: 15.0,
                padding_ratio: 0.75,
                font_weight: FontWeight::Bold,
                fill: Paint::new(Color::white(), 0.85),
                stroke: Some(Paint::new(Color::black(), 0.6)),
                shadow: Some(black_shadow),
            },
            WatermarkTheme::Classic => Self {
                min_font_size: 12.0,
                width_divisor: 20.0,
                height_divisor: 25.0,
                stroke_divisor: 15.0,
                padding_ratio: 0.75,
                font_weight: FontWeight::SemiBold,
                fill: Paint::new(Color::white(), 0.7),
                stroke: None,
                shadow: Some(ShadowStyle {
                    offset_x: 0,
                    offset_y: 0,
                    blur: 5.0,
                    paint: Paint::new(Color::black(), 0.5),
                }),
            },
            WatermarkTheme::Indigo => Self {
                fill: Paint::new(Color::new(0xE0, 0xE7, 0xFF), 0.85),
                stroke: Some(Paint::new(Color::new(0x31, 0x2E, 0x81), 0.6)),
                ..Self::from_theme(WatermarkTheme::Contrast)
            },
            WatermarkTheme::Minimal => Self {
                font_weight: FontWeight::Regular,
                shadow: None,
                ..Self::from_theme(WatermarkTheme::Contrast)
            },
        }
    }

    /// Replace the fill color, keeping its opacity
    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.fill.color = color;
        self
    }

    pub fn with_fill_opacity(mut self, opacity: f32) -> Self {
        self.fill.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Font size for an image of the given dimensions.
    pub fn font_size_for(&self, width: u32, height: u32) -> f32 {
        let by_width = width as f32 / self.width_divisor;
        let by_height = height as f32 / self.height_divisor;
        by_width.min(by_height).max(self.min_font_size)
    }

    /// Compute per-image parameters.
    pub fn derive(&self, width: u32, height: u32) -> StyleParams {
        let font_size = self.font_size_for(width, height);
        let padding = font_size * self.padding_ratio;

        StyleParams {
            font_size,
            stroke_width: font_size / self.stroke_divisor,
            padding,
            anchor_x: width as f32 / 2.0,
            anchor_y: height as f32 - padding,
        }
    }
}

/// Numbers derived from the surface dimensions on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParams {
    pub font_size: f32,
    pub stroke_width: f32,
    /// Gap between the bottom edge and the text's descender line
    pub padding: f32,
    /// Horizontal center of the text line
    pub anchor_x: f32,
    /// Y coordinate of the descender line
    pub anchor_y: f32,
}
