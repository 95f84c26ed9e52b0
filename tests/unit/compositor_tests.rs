// Watermark compositor unit tests

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use rstest::rstest;
use std::io::Cursor;
use watermarker::decoder::{DecodeError, DecodedSurface, ImageDecoder, SourceImage};
use watermarker::watermark::*;

fn surface(width: u32, height: u32) -> DecodedSurface {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
    });
    DecodedSurface::from_rgba(pixels).unwrap()
}

fn decode_png(image: &CompositedImage) -> RgbaImage {
    image::load_from_memory_with_format(&image.data, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([60, 120, 180]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

#[rstest]
#[case(1, 1)]
#[case(100, 100)]
#[case(800, 600)]
#[case(333, 1200)]
fn test_output_dimensions_match_input(#[case] width: u32, #[case] height: u32) {
    let result = WatermarkCompositor::new()
        .composite(&surface(width, height), "SAMPLE")
        .unwrap();

    assert_eq!((result.width, result.height), (width, height));
    assert_eq!(decode_png(&result).dimensions(), (width, height));
}

#[test]
fn test_sample_style_parameters() {
    let params = WatermarkStyle::default().derive(800, 600);

    assert!((params.font_size - 27.27).abs() < 0.01);
    assert!((params.stroke_width - 1.818).abs() < 0.01);
    assert!((params.padding - 20.45).abs() < 0.01);
    assert_eq!(params.anchor_x, 400.0);
    assert!((params.anchor_y - 579.55).abs() < 0.01);
}

#[test]
fn test_font_size_is_monotonic_with_floor() {
    let style = WatermarkStyle::default();
    let mut previous = 0.0;

    for side in (10..4000).step_by(37) {
        let size = style.font_size_for(side, side);
        assert!(size >= 16.0);
        assert!(size >= previous);
        previous = size;
    }
    assert_eq!(style.font_size_for(100, 100), 16.0);
}

#[rstest]
#[case("")]
#[case(" ")]
#[case("\t\n")]
fn test_blank_text_leaves_pixels_unchanged(#[case] text: &str) {
    let surface = surface(120, 80);
    let result = WatermarkCompositor::new().composite(&surface, text).unwrap();
    assert_eq!(&decode_png(&result), surface.pixels());
}

#[rstest]
#[case(WatermarkTheme::Contrast)]
#[case(WatermarkTheme::Classic)]
#[case(WatermarkTheme::Indigo)]
#[case(WatermarkTheme::Minimal)]
fn test_every_theme_is_deterministic(#[case] theme: WatermarkTheme) {
    let compositor = WatermarkCompositor::with_style(WatermarkStyle::from_theme(theme));
    let surface = surface(300, 200);

    let first = compositor.composite(&surface, "© 2024 Studio").unwrap();
    let second = compositor.composite(&surface, "© 2024 Studio").unwrap();
    assert_eq!(first, second);
    assert_ne!(&decode_png(&first), surface.pixels());
}

#[test]
fn test_watermark_only_touches_bottom_band() {
    let surface = surface(640, 480);
    let result = WatermarkCompositor::new()
        .composite(&surface, "SAMPLE")
        .unwrap();
    let pixels = decode_png(&result);

    let changed_rows: Vec<u32> = (0..480)
        .filter(|&y| (0..640).any(|x| pixels.get_pixel(x, y) != surface.pixels().get_pixel(x, y)))
        .collect();

    assert!(!changed_rows.is_empty());
    assert!(changed_rows.iter().all(|&y| y > 380), "rows {changed_rows:?}");
}

#[tokio::test]
async fn test_decode_then_composite_jpeg() {
    let decoder = ImageDecoder::new();
    let compositor = WatermarkCompositor::new();
    let source = SourceImage::new(jpeg(200, 120), "image/jpeg");

    let result = composite_source(&decoder, &compositor, source, "Proof")
        .await
        .unwrap();

    assert_eq!(result.content_type(), "image/png");
    assert!(result.to_data_url().starts_with("data:image/png;base64,iVBORw0KGgo"));
    let decoded =
        image::load_from_memory_with_format(&result.data, image::ImageFormat::Png).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
}

#[tokio::test]
async fn test_corrupt_input_never_yields_output() {
    let decoder = ImageDecoder::new();
    let compositor = WatermarkCompositor::new();
    let mut data = jpeg(64, 64);
    data.truncate(data.len() / 3);
    let source = SourceImage::new(data, "image/png");

    let err = composite_source(&decoder, &compositor, source, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, CompositeError::Decode(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let decoder = ImageDecoder::new();
    let compositor = WatermarkCompositor::new();
    let source = SourceImage::new(jpeg(10, 10), "application/pdf");

    let err = composite_source(&decoder, &compositor, source, "x")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CompositeError::Decode(DecodeError::UnsupportedMediaType { .. })
    ));
}

#[test]
fn test_save_with_default_filename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_OUTPUT_FILENAME);

    let result = WatermarkCompositor::new()
        .composite(&surface(64, 64), "Saved")
        .unwrap();
    result.write_to(&path).unwrap();

    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (64, 64));
}

#[test]
fn test_measure_text_scales_with_size() {
    let small = measure_text("Watermark", 16.0, FontWeight::Bold).unwrap();
    let large = measure_text("Watermark", 32.0, FontWeight::Bold).unwrap();

    assert!((large.width / small.width - 2.0).abs() < 0.05);
    assert!(large.height() > small.height());
}
