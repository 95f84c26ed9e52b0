// Decoder unit tests

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use rstest::rstest;
use std::io::Cursor;
use watermarker::decoder::*;

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 80, 40]));
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Png)
}

#[rstest]
#[case(ImageFormat::Png, "image/png")]
#[case(ImageFormat::Jpeg, "image/jpeg")]
#[case(ImageFormat::Gif, "image/gif")]
#[case(ImageFormat::Bmp, "image/bmp")]
#[tokio::test]
async fn test_decode_keeps_natural_dimensions(
    #[case] format: ImageFormat,
    #[case] mime: &str,
) {
    let image = RgbImage::from_pixel(37, 23, Rgb([10, 120, 250]));
    let data = encode(DynamicImage::ImageRgb8(image), format);

    let surface = ImageDecoder::new()
        .decode(SourceImage::new(data, mime))
        .await
        .unwrap();
    assert_eq!(surface.dimensions(), (37, 23));
}

#[tokio::test]
async fn test_decode_png_with_alpha() {
    let image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 100]));
    let data = encode(DynamicImage::ImageRgba8(image), ImageFormat::Png);

    let surface = ImageDecoder::new()
        .decode(SourceImage::new(data, "image/png"))
        .await
        .unwrap();
    assert!(surface.has_alpha());
    assert_eq!(surface.pixels().get_pixel(3, 3)[3], 100);
}

#[tokio::test]
async fn test_corrupt_png_is_decode_error() {
    let mut data = png(64, 64);
    data.truncate(60);

    let result = ImageDecoder::new()
        .decode(SourceImage::new(data, "image/png"))
        .await;
    assert!(result.is_err());
    assert!(!result.unwrap_err().is_retryable());
}

#[rstest]
#[case("text/plain")]
#[case("application/pdf")]
#[case("")]
#[tokio::test]
async fn test_non_image_type_rejected(#[case] mime: &str) {
    let result = ImageDecoder::new()
        .decode(SourceImage::new(png(4, 4), mime))
        .await;
    assert!(matches!(
        result,
        Err(DecodeError::UnsupportedMediaType { .. })
    ));
}

#[tokio::test]
async fn test_limits_reject_large_image() {
    let limits = DecodeLimits {
        max_width: 50,
        ..DecodeLimits::default()
    };
    let result = ImageDecoder::with_limits(limits)
        .decode(SourceImage::new(png(51, 10), "image/png"))
        .await;
    assert!(matches!(result, Err(DecodeError::ImageTooLarge { .. })));
}

#[test]
fn test_source_from_path_infers_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.PNG");
    std::fs::write(&path, png(5, 5)).unwrap();

    let source = SourceImage::from_path(&path).unwrap();
    assert_eq!(source.declared_type(), "image/png");

    let surface = ImageDecoder::new().decode_blocking(&source).unwrap();
    assert_eq!(surface.dimensions(), (5, 5));
}

#[rstest]
#[case("a.png", Some("image/png"))]
#[case("a.jpg", Some("image/jpeg"))]
#[case("a.jpeg", Some("image/jpeg"))]
#[case("a.webp", Some("image/webp"))]
#[case("a.gif", Some("image/gif"))]
#[case("a.txt", None)]
#[case("noext", None)]
fn test_mime_type_for_path(#[case] path: &str, #[case] expected: Option<&str>) {
    assert_eq!(mime_type_for_path(path), expected);
}
