// Configuration module unit tests

use std::io::Write;
use watermarker::config::*;
use watermarker::watermark::{Color, WatermarkTheme, DEFAULT_OUTPUT_FILENAME};

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.logging.level, "info");
    assert!(!config.logging.json);
    assert_eq!(config.decoder.max_file_size, 50 * 1024 * 1024);
    assert_eq!(config.decoder.max_width, 16384);
    assert_eq!(config.decoder.max_pixels, 100_000_000);
    assert_eq!(config.watermark.theme, WatermarkTheme::Contrast);
    assert_eq!(config.output.filename, DEFAULT_OUTPUT_FILENAME);
}

#[test]
fn test_can_deserialize_full_yaml_config() {
    let yaml = r#"
logging:
  level: debug
  json: true
decoder:
  max_file_size: 1048576
  max_width: 4096
  max_height: 4096
  max_pixels: 16000000
watermark:
  theme: classic
  default_text: "Proof copy"
output:
  filename: proof.png
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    config.validate().unwrap();

    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert_eq!(config.decoder.max_file_size, 1_048_576);
    assert_eq!(config.decoder.max_height, 4096);
    assert_eq!(config.watermark.theme, WatermarkTheme::Classic);
    assert_eq!(config.watermark.default_text, "Proof copy");
    assert_eq!(config.output.filename, "proof.png");
}

#[test]
fn test_unknown_theme_fails_to_parse() {
    let yaml = "watermark:\n  theme: neon\n";
    assert!(matches!(
        Config::from_yaml_with_env(yaml),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "watermark:\n  theme: minimal\n  fill_color: \"#0F0\"").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.watermark.theme, WatermarkTheme::Minimal);

    let style = config.style().unwrap();
    assert_eq!(style.fill.color, Color::new(0, 255, 0));
    assert!(style.shadow.is_none());
}

#[test]
fn test_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::from_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::Read(_))));
}

#[test]
fn test_env_var_in_filename() {
    std::env::set_var("WATERMARKER_CONFIG_TEST_NAME", "from-env");
    let yaml = "output:\n  filename: ${WATERMARKER_CONFIG_TEST_NAME}.png\n";

    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.output.filename, "from-env.png");
    assert!(config.validate().is_ok());
}
