//! Configuration loading and typed config structures for the breach overlay.
//!
//! The canonical configuration lives in `breach-overlay.yaml` at the project
//! root. Every field has a default, so a missing or empty file yields the
//! same behaviour as the stock plugin settings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::presentation::DisplaySettings;
use crate::tracker::TrackerSettings;

/// Metadata path of breach objects in the entity list.
pub const DEFAULT_TYPE_PATH: &str = "Metadata/MiscellaneousObjects/Breach/BreachObject";

/// Smallest accepted circle size.
const MIN_CIRCLE_SIZE: f32 = 50.0;

/// Largest accepted circle size.
const MAX_CIRCLE_SIZE: f32 = 1000.0;

/// Smallest accepted map scale.
const MIN_SCALE: f32 = 0.1;

/// Largest accepted map scale.
const MAX_SCALE: f32 = 10.0;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its accepted range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level overlay configuration.
///
/// Mirrors the structure of `breach-overlay.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverlayConfig {
    /// Tracking rules.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Indicator sizes and display cap.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Frame loop parameters.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OverlayConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document means all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is inside its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.validity_window_ms == 0 {
            return Err(invalid("tracker.validity_window_ms must be at least 1"));
        }
        if self.tracker.type_path.is_empty() {
            return Err(invalid("tracker.type_path must not be empty"));
        }
        check_range(
            "display.max_circle_size",
            self.display.max_circle_size,
            MIN_CIRCLE_SIZE,
            MAX_CIRCLE_SIZE,
        )?;
        check_range(
            "display.static_circle_size",
            self.display.static_circle_size,
            MIN_CIRCLE_SIZE,
            MAX_CIRCLE_SIZE,
        )?;
        check_range(
            "display.custom_scale",
            self.display.custom_scale,
            MIN_SCALE,
            MAX_SCALE,
        )?;
        if !matches!(self.logging.output.as_str(), "log" | "json") {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "logging.output must be \"log\" or \"json\", got {:?}",
                    self.logging.output
                ),
            });
        }
        Ok(())
    }

    /// Settings for the [`EventTracker`](crate::tracker::EventTracker).
    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            type_path: self.tracker.type_path.clone(),
            validity_window: Duration::from_millis(self.tracker.validity_window_ms),
            display_cap: self.display.display_cap,
        }
    }

    /// Settings for [`plan_frame`](crate::presentation::plan_frame).
    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings {
            max_circle_size: self.display.max_circle_size,
            static_circle_size: self.display.static_circle_size,
            scale: self.display.custom_scale,
            timer_unit: self.display.timer_unit.clone(),
        }
    }
}

/// Tracking rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// Substring an entity's type path must contain to be tracked.
    #[serde(default = "default_type_path")]
    pub type_path: String,

    /// How long a transitioned event stays visible, in milliseconds.
    #[serde(default = "default_validity_window_ms")]
    pub validity_window_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            type_path: default_type_path(),
            validity_window_ms: default_validity_window_ms(),
        }
    }
}

/// Indicator sizes and display cap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisplayConfig {
    /// Radius the expanding circle reaches at the end of the window.
    #[serde(default = "default_circle_size")]
    pub max_circle_size: f32,

    /// Radius of the fixed marker circle.
    #[serde(default = "default_circle_size")]
    pub static_circle_size: f32,

    /// Multiplier applied to every radius.
    #[serde(default = "default_custom_scale")]
    pub custom_scale: f32,

    /// Maximum number of events drawn; 0 draws all of them.
    #[serde(default)]
    pub display_cap: usize,

    /// Suffix appended to the countdown text.
    #[serde(default = "default_timer_unit")]
    pub timer_unit: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_circle_size: default_circle_size(),
            static_circle_size: default_circle_size(),
            custom_scale: default_custom_scale(),
            display_cap: 0,
            timer_unit: default_timer_unit(),
        }
    }
}

/// Frame loop parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunnerConfig {
    /// Milliseconds between frames; 0 runs frames back to back.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Stop after this many frames; 0 runs until shutdown.
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            max_ticks: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Frame output format: `log` or `json`.
    #[serde(default = "default_log_output")]
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: default_log_output(),
        }
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            reason: format!("{field} must be within {min}..={max}, got {value}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_type_path() -> String {
    DEFAULT_TYPE_PATH.to_owned()
}

const fn default_validity_window_ms() -> u64 {
    53_000
}

const fn default_circle_size() -> f32 {
    455.0
}

const fn default_custom_scale() -> f32 {
    1.0
}

fn default_timer_unit() -> String {
    "s".to_owned()
}

const fn default_frame_interval_ms() -> u64 {
    16
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_output() -> String {
    "log".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = OverlayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker.validity_window_ms, 53_000);
        assert_eq!(config.tracker.type_path, DEFAULT_TYPE_PATH);
        assert_eq!(config.display.display_cap, 0);
        assert_eq!(config.runner.frame_interval_ms, 16);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
tracker:
  type_path: "Metadata/Test/Rift"
  validity_window_ms: 30000

display:
  max_circle_size: 600
  static_circle_size: 120
  custom_scale: 2.5
  display_cap: 4
  timer_unit: " sec"

runner:
  frame_interval_ms: 33
  max_ticks: 100

logging:
  level: "debug"
  output: "json"
"#;

        let config = OverlayConfig::parse(yaml);
        assert!(config.is_ok(), "parse failed: {config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.tracker.type_path, "Metadata/Test/Rift");
        assert_eq!(config.tracker.validity_window_ms, 30_000);
        assert_eq!(config.display.display_cap, 4);
        assert_eq!(config.display.timer_unit, " sec");
        assert_eq!(config.runner.max_ticks, 100);
        assert_eq!(config.logging.output, "json");

        let settings = config.tracker_settings();
        assert_eq!(settings.validity_window, Duration::from_secs(30));
        assert_eq!(settings.display_cap, 4);

        let display = config.display_settings();
        assert!((display.scale - 2.5).abs() < f32::EPSILON);
        assert!((display.static_circle_size - 120.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "display:\n  display_cap: 3\n";
        let config = OverlayConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.display.display_cap, 3);
        assert_eq!(config.tracker.validity_window_ms, 53_000);
        assert!((config.display.max_circle_size - 455.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = OverlayConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let yaml = "tracker:\n  validity_window_ms: 0\n";
        assert!(matches!(
            OverlayConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn unknown_output_is_rejected() {
        let yaml = "logging:\n  output: \"xml\"\n";
        assert!(matches!(
            OverlayConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn out_of_range_scale_is_rejected() {
        let yaml = "display:\n  custom_scale: 20.0\n";
        assert!(matches!(
            OverlayConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn out_of_range_circle_is_rejected() {
        let yaml = "display:\n  static_circle_size: 10\n";
        assert!(matches!(
            OverlayConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let yaml = "tracker: [unclosed";
        assert!(matches!(
            OverlayConfig::parse(yaml),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("breach-overlay.yaml");
        if path.exists() {
            let config = OverlayConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
