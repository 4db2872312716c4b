// Physkeys Settings Module
// Behavioural toggles and the long-press threshold, loaded from settings.toml

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Accepted long-press threshold range in milliseconds
pub const LONG_PRESS_THRESHOLD_RANGE: std::ops::RangeInclusive<u64> = 50..=1000;

const DEFAULT_LONG_PRESS_THRESHOLD_MS: u64 = 500;

/// User settings consumed by the router
///
/// Loaded from a TOML file (default: ~/.config/physkeys/settings.toml):
///
/// ```toml
/// [timing]
/// long_press_threshold_ms = 450
///
/// [features]
/// long_press_means_shift = false
/// sym_auto_close = "yes"
/// nav_mode = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    long_press_threshold_ms: u64,

    /// Long press yields the Shift variant instead of the Alt one
    pub long_press_means_shift: bool,

    /// Close the SYM page after a glyph commit or on Enter/Alt
    pub sym_auto_close: bool,

    /// Ctrl double-tap enters nav mode outside text fields
    pub nav_mode_enabled: bool,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),

    #[error("Setting out of range: {0}")]
    OutOfRange(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    #[serde(default)]
    timing: Option<TimingSettings>,

    #[serde(default)]
    features: Option<HashMap<String, toml::Value>>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TimingSettings {
    #[serde(default)]
    long_press_threshold_ms: Option<u64>,
}

impl Settings {
    /// Settings with every default applied
    pub fn new() -> Self {
        Self {
            long_press_threshold_ms: DEFAULT_LONG_PRESS_THRESHOLD_MS,
            long_press_means_shift: false,
            sym_auto_close: true,
            nav_mode_enabled: true,
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let toml_settings: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(threshold) = toml_settings.timing.and_then(|t| t.long_press_threshold_ms) {
            settings.set_long_press_threshold_ms(threshold)?;
        }

        if let Some(features) = toml_settings.features {
            for (key, value) in features {
                let enabled = parse_bool_value(&value)?;
                match key.as_str() {
                    "long_press_means_shift" => settings.long_press_means_shift = enabled,
                    "sym_auto_close" => settings.sym_auto_close = enabled,
                    "nav_mode" | "nav_mode_enabled" => settings.nav_mode_enabled = enabled,
                    "swipe_to_delete" => {
                        log::debug!("setting '{}' has no effect on physical keys", key)
                    }
                    _ => log::warn!("Unknown feature '{}' in settings, ignored", key),
                }
            }
        }

        Ok(settings)
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("physkeys").join("settings.toml"))
    }

    /// Load from default location (~/.config/physkeys/settings.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// Reload settings from the original file
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        if let Some(ref path) = self.source_path {
            let new_settings = Self::from_file(path)?;
            *self = new_settings;
            Ok(())
        } else {
            Err(SettingsError::InvalidValue("No source path set".to_string()))
        }
    }

    pub fn long_press_threshold_ms(&self) -> u64 {
        self.long_press_threshold_ms
    }

    pub fn long_press_threshold(&self) -> Duration {
        Duration::from_millis(self.long_press_threshold_ms)
    }

    /// Set the long-press threshold, rejecting values outside 50-1000 ms
    pub fn set_long_press_threshold_ms(&mut self, ms: u64) -> Result<(), SettingsError> {
        if !LONG_PRESS_THRESHOLD_RANGE.contains(&ms) {
            return Err(SettingsError::OutOfRange(format!(
                "long_press_threshold_ms must be 50-1000ms, got {}",
                ms
            )));
        }
        self.long_press_threshold_ms = ms;
        Ok(())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// Parse a TOML value as a boolean
fn parse_bool_value(value: &toml::Value) -> Result<bool, SettingsError> {
    match value {
        toml::Value::Boolean(b) => Ok(*b),
        toml::Value::Integer(1) => Ok(true),
        toml::Value::Integer(0) => Ok(false),
        toml::Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(SettingsError::InvalidValue(format!(
                "Cannot convert '{}' to boolean",
                s
            ))),
        },
        _ => Err(SettingsError::InvalidValue(format!(
            "Cannot convert {:?} to boolean",
            value
        ))),
    }
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Physkeys Settings
# Place this file at: ~/.config/physkeys/settings.toml

[timing]
# Hold time before a key yields its alternate character (50-1000)
long_press_threshold_ms = 500

[features]
# Long press gives the uppercase letter instead of the Alt character
long_press_means_shift = false

# Close the SYM page after inserting a symbol, or on Enter/Alt
sym_auto_close = true

# Double-tap Ctrl outside text fields to navigate with ESDF/IJKL
nav_mode = true
"#
}
