//! Highlighter configuration
//!
//! Timing and layout knobs for the selection and scroll machinery. A
//! configuration can be built programmatically, loaded from a TOML file, or
//! overridden from environment variables.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How the renderer should pick the page scale
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawScaleValue", into = "RawScaleValue")]
pub enum ScaleValue {
    #[default]
    Auto,
    PageFit,
    PageWidth,
    PageActual,
    /// Explicit zoom factor (1.0 = 100%)
    Number(f64),
}

impl ScaleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScaleValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ScaleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleValue::Auto => f.write_str("auto"),
            ScaleValue::PageFit => f.write_str("page-fit"),
            ScaleValue::PageWidth => f.write_str("page-width"),
            ScaleValue::PageActual => f.write_str("page-actual"),
            ScaleValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for ScaleValue {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(ScaleValue::Auto),
            "page-fit" => Ok(ScaleValue::PageFit),
            "page-width" => Ok(ScaleValue::PageWidth),
            "page-actual" => Ok(ScaleValue::PageActual),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(ScaleValue::Number)
                .ok_or_else(|| ConfigError::invalid("scale_value", other)),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawScaleValue {
    Number(f64),
    Keyword(String),
}

impl TryFrom<RawScaleValue> for ScaleValue {
    type Error = ConfigError;

    fn try_from(raw: RawScaleValue) -> Result<Self, Self::Error> {
        match raw {
            RawScaleValue::Number(n) => n.to_string().parse(),
            RawScaleValue::Keyword(s) => s.parse(),
        }
    }
}

impl From<ScaleValue> for RawScaleValue {
    fn from(value: ScaleValue) -> Self {
        match value {
            ScaleValue::Number(n) => RawScaleValue::Number(n),
            keyword => RawScaleValue::Keyword(keyword.to_string()),
        }
    }
}

/// Configuration for the highlighter engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlighterConfig {
    /// Quiet period before a text selection is finalized
    pub selection_debounce_ms: u64,
    /// Quiet period before a resize triggers a scale recompute
    pub scale_debounce_ms: u64,
    /// Pixels left above a highlight when scrolling to it
    pub scroll_margin: f64,
    /// How long scroll events are ignored after a programmatic scroll
    pub scroll_settle_ms: u64,
    /// Scale applied once the document is ready and after every resize
    pub scale_value: ScaleValue,
    /// Smallest width and height an area selection must reach
    pub min_area_selection_px: f64,
}

impl Default for HighlighterConfig {
    fn default() -> Self {
        Self {
            selection_debounce_ms: 500,
            scale_debounce_ms: 500,
            scroll_margin: 10.0,
            scroll_settle_ms: 100,
            scale_value: ScaleValue::Auto,
            min_area_selection_px: 1.0,
        }
    }
}

impl HighlighterConfig {
    pub const ENV_SELECTION_DEBOUNCE_MS: &'static str = "PDF_HIGHLIGHTER_SELECTION_DEBOUNCE_MS";
    pub const ENV_SCALE_DEBOUNCE_MS: &'static str = "PDF_HIGHLIGHTER_SCALE_DEBOUNCE_MS";
    pub const ENV_SCROLL_MARGIN: &'static str = "PDF_HIGHLIGHTER_SCROLL_MARGIN";
    pub const ENV_SCALE_VALUE: &'static str = "PDF_HIGHLIGHTER_SCALE_VALUE";

    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selection finalize debounce in milliseconds.
    pub fn with_selection_debounce_ms(mut self, ms: u64) -> Self {
        self.selection_debounce_ms = ms;
        self
    }

    /// Sets the scale recompute debounce in milliseconds.
    pub fn with_scale_debounce_ms(mut self, ms: u64) -> Self {
        self.scale_debounce_ms = ms;
        self
    }

    pub fn with_scroll_margin(mut self, margin: f64) -> Self {
        self.scroll_margin = margin;
        self
    }

    pub fn with_scroll_settle_ms(mut self, ms: u64) -> Self {
        self.scroll_settle_ms = ms;
        self
    }

    pub fn with_scale_value(mut self, scale_value: ScaleValue) -> Self {
        self.scale_value = scale_value;
        self
    }

    pub fn with_min_area_selection_px(mut self, px: f64) -> Self {
        self.min_area_selection_px = px;
        self
    }

    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    pub fn scale_debounce(&self) -> Duration {
        Duration::from_millis(self.scale_debounce_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - `PDF_HIGHLIGHTER_SELECTION_DEBOUNCE_MS` (default: 500)
    /// - `PDF_HIGHLIGHTER_SCALE_DEBOUNCE_MS` (default: 500)
    /// - `PDF_HIGHLIGHTER_SCROLL_MARGIN` (default: 10)
    /// - `PDF_HIGHLIGHTER_SCALE_VALUE` (default: auto)
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Applies environment overrides to an existing configuration.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var(Self::ENV_SELECTION_DEBOUNCE_MS) {
            self.selection_debounce_ms = parse_env(Self::ENV_SELECTION_DEBOUNCE_MS, &val)?;
        }

        if let Ok(val) = std::env::var(Self::ENV_SCALE_DEBOUNCE_MS) {
            self.scale_debounce_ms = parse_env(Self::ENV_SCALE_DEBOUNCE_MS, &val)?;
        }

        if let Ok(val) = std::env::var(Self::ENV_SCROLL_MARGIN) {
            self.scroll_margin = parse_env(Self::ENV_SCROLL_MARGIN, &val)?;
        }

        if let Ok(val) = std::env::var(Self::ENV_SCALE_VALUE) {
            self.scale_value = val
                .parse()
                .map_err(|_| ConfigError::invalid(Self::ENV_SCALE_VALUE, &val))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Parses configuration from a TOML string. Missing keys take their defaults.
    ///
    /// ```toml
    /// selection_debounce_ms = 300
    /// scroll_margin = 24.0
    /// scale_value = "page-width"
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string(self)?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }

    /// Checks value ranges that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scroll_margin.is_finite() || self.scroll_margin < 0.0 {
            return Err(ConfigError::invalid(
                "scroll_margin",
                self.scroll_margin,
            ));
        }
        if !self.min_area_selection_px.is_finite() || self.min_area_selection_px < 0.0 {
            return Err(ConfigError::invalid(
                "min_area_selection_px",
                self.min_area_selection_px,
            ));
        }
        if let ScaleValue::Number(n) = self.scale_value {
            if !n.is_finite() || n <= 0.0 {
                return Err(ConfigError::invalid("scale_value", n));
            }
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, value))
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: impl fmt::Display) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            HighlighterConfig::ENV_SELECTION_DEBOUNCE_MS,
            HighlighterConfig::ENV_SCALE_DEBOUNCE_MS,
            HighlighterConfig::ENV_SCROLL_MARGIN,
            HighlighterConfig::ENV_SCALE_VALUE,
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = HighlighterConfig::default();
        assert_eq!(config.selection_debounce_ms, 500);
        assert_eq!(config.scale_debounce_ms, 500);
        assert_eq!(config.scroll_margin, 10.0);
        assert_eq!(config.scroll_settle_ms, 100);
        assert_eq!(config.scale_value, ScaleValue::Auto);
        assert_eq!(config.min_area_selection_px, 1.0);
        assert_eq!(config.selection_debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_builder_pattern() {
        let config = HighlighterConfig::new()
            .with_selection_debounce_ms(250)
            .with_scroll_margin(20.0)
            .with_scale_value(ScaleValue::PageWidth);

        assert_eq!(config.selection_debounce_ms, 250);
        assert_eq!(config.scroll_margin, 20.0);
        assert_eq!(config.scale_value, ScaleValue::PageWidth);
        assert_eq!(config.scale_debounce_ms, 500);
    }

    #[test]
    fn test_scale_value_parsing() {
        assert_eq!("auto".parse::<ScaleValue>().unwrap(), ScaleValue::Auto);
        assert_eq!("page-fit".parse::<ScaleValue>().unwrap(), ScaleValue::PageFit);
        assert_eq!("page-actual".parse::<ScaleValue>().unwrap(), ScaleValue::PageActual);
        assert_eq!("1.5".parse::<ScaleValue>().unwrap(), ScaleValue::Number(1.5));
        assert!("zoomed".parse::<ScaleValue>().is_err());
        assert!("-2".parse::<ScaleValue>().is_err());
        assert_eq!(ScaleValue::PageWidth.to_string(), "page-width");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = HighlighterConfig::from_toml_str(
            r#"
            selection_debounce_ms = 300
            scale_value = "page-width"
            "#,
        )
        .unwrap();

        assert_eq!(config.selection_debounce_ms, 300);
        assert_eq!(config.scale_value, ScaleValue::PageWidth);
        assert_eq!(config.scroll_margin, 10.0);
    }

    #[test]
    fn test_from_toml_numeric_scale() {
        let config = HighlighterConfig::from_toml_str("scale_value = 1.25").unwrap();
        assert_eq!(config.scale_value, ScaleValue::Number(1.25));
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(matches!(
            HighlighterConfig::from_toml_str("scroll_margin = -5.0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            HighlighterConfig::from_toml_str("selection_debounce_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highlighter.toml");

        let config = HighlighterConfig::new()
            .with_scale_debounce_ms(750)
            .with_scale_value(ScaleValue::Number(2.0));
        config.save_to_file(&path).unwrap();

        let loaded = HighlighterConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let result = HighlighterConfig::from_file("/nonexistent/highlighter.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(HighlighterConfig::ENV_SELECTION_DEBOUNCE_MS, "200");
        std::env::set_var(HighlighterConfig::ENV_SCROLL_MARGIN, "32");
        std::env::set_var(HighlighterConfig::ENV_SCALE_VALUE, "page-fit");

        let config = HighlighterConfig::from_env().unwrap();
        assert_eq!(config.selection_debounce_ms, 200);
        assert_eq!(config.scroll_margin, 32.0);
        assert_eq!(config.scale_value, ScaleValue::PageFit);
        assert_eq!(config.scale_debounce_ms, 500);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        clear_env();
        std::env::set_var(HighlighterConfig::ENV_SCALE_DEBOUNCE_MS, "fast");

        let err = HighlighterConfig::from_env().unwrap_err();
        assert!(err.to_string().contains(HighlighterConfig::ENV_SCALE_DEBOUNCE_MS));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        clear_env();
        std::env::set_var(HighlighterConfig::ENV_SCALE_VALUE, "1.5");

        let config = HighlighterConfig::from_toml_str("scale_value = \"auto\"\nscroll_margin = 4.0")
            .unwrap()
            .with_env_overrides()
            .unwrap();
        assert_eq!(config.scale_value, ScaleValue::Number(1.5));
        assert_eq!(config.scroll_margin, 4.0);

        clear_env();
    }
}
