// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::decoder::DecodeLimits;
use crate::logging::{is_valid_level, LoggingConfig};
use crate::watermark::{parse_hex_color, WatermarkStyle, WatermarkTheme, DEFAULT_OUTPUT_FILENAME};

/// Errors raised while loading or validating configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub decoder: DecodeLimits,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_text() -> String {
    "Sua Marca d'Água".to_string()
}

/// Watermark appearance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatermarkConfig {
    #[serde(default)]
    pub theme: WatermarkTheme,

    /// Text used when the caller gives none
    #[serde(default = "default_text")]
    pub default_text: String,

    /// Overrides the theme's fill color (#RGB or #RRGGBB)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,

    /// Overrides the theme's fill opacity (0.0 to 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f32>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            theme: WatermarkTheme::default(),
            default_text: default_text(),
            fill_color: None,
            fill_opacity: None,
        }
    }
}

fn default_filename() -> String {
    DEFAULT_OUTPUT_FILENAME.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    /// File name for saved images
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });
        if let Some(var_name) = missing {
            return Err(ConfigError::MissingEnvVar(var_name));
        }

        // An empty document means all defaults
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_level(&self.logging.level) {
            return Err(ConfigError::Invalid(format!(
                "logging.level '{}' is not a valid filter",
                self.logging.level
            )));
        }

        let limits = &self.decoder;
        if limits.max_file_size == 0
            || limits.max_width == 0
            || limits.max_height == 0
            || limits.max_pixels == 0
        {
            return Err(ConfigError::Invalid(
                "decoder limits must be greater than zero".to_string(),
            ));
        }

        if let Some(color) = &self.watermark.fill_color {
            parse_hex_color(color)
                .map_err(|e| ConfigError::Invalid(format!("watermark.fill_color: {}", e)))?;
        }

        if let Some(opacity) = self.watermark.fill_opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ConfigError::Invalid(format!(
                    "watermark.fill_opacity {} is outside 0.0..=1.0",
                    opacity
                )));
            }
        }

        let filename = self.output.filename.trim();
        if filename.is_empty() {
            return Err(ConfigError::Invalid(
                "output.filename cannot be empty".to_string(),
            ));
        }
        if !filename.to_ascii_lowercase().ends_with(".png") {
            return Err(ConfigError::Invalid(format!(
                "output.filename '{}' must end with .png",
                filename
            )));
        }

        Ok(())
    }

    /// Watermark style for the configured theme and overrides.
    pub fn style(&self) -> Result<WatermarkStyle, ConfigError> {
        let mut style = WatermarkStyle::from_theme(self.watermark.theme);

        if let Some(color) = &self.watermark.fill_color {
            let color = parse_hex_color(color)
                .map_err(|e| ConfigError::Invalid(format!("watermark.fill_color: {}", e)))?;
            style = style.with_fill_color(color);
        }
        if let Some(opacity) = self.watermark.fill_opacity {
            style = style.with_fill_opacity(opacity);
        }

        Ok(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::Color;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml_with_env("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_text() {
        assert_eq!(Config::default().watermark.default_text, "Sua Marca d'Água");
        let config = Config::from_yaml_with_env("watermark:\n  theme: classic\n").unwrap();
        assert_eq!(config.watermark.default_text, "Sua Marca d'Água");
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("WATERMARKER_TEST_TEXT", "ACME Corp");
        let yaml = r#"
watermark:
  default_text: "${WATERMARKER_TEST_TEXT}"
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(config.watermark.default_text, "ACME Corp");
    }

    #[test]
    fn test_missing_env_var() {
        let yaml = "output:\n  filename: ${WATERMARKER_TEST_UNSET_VAR}.png\n";
        let err = Config::from_yaml_with_env(yaml).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingEnvVar("WATERMARKER_TEST_UNSET_VAR".to_string())
        );
    }

    #[test]
    fn test_style_overrides() {
        let yaml = r##"
watermark:
  theme: indigo
  fill_color: "#FF0000"
  fill_opacity: 0.5
"##;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        let style = config.style().unwrap();
        assert_eq!(style.fill.color, Color::new(255, 0, 0));
        assert_eq!(style.fill.opacity, 0.5);
        assert_eq!(
            style.stroke,
            WatermarkStyle::from_theme(WatermarkTheme::Indigo).stroke
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.output.filename = "out.jpg".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.decoder.max_pixels = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watermark.fill_color = Some("white".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.watermark.fill_opacity = Some(1.5);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "very-loud=?".to_string();
        assert!(config.validate().is_err());
    }
}
