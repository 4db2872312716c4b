// Physkeys Config Parser - TOML with Serde
// Parses keyboard tables (layout, multi-tap, Ctrl, SYM, nav) from TOML files

use std::fs;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::ctrl::{CtrlMapping, CtrlMappingError, CtrlTable};
use crate::key::key_from_name;
use crate::layout::{KeyChars, KeyLayout};
use crate::mode::{NavMap, SymLayers, SymPage};
use crate::resolve::{MultiTapTable, DEFAULT_MULTI_TAP_WINDOW};
use crate::settings::Settings;
use crate::transform::{InputEventRouter, RouterConfig};
use crate::Key;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid character: {0}")]
    InvalidChar(String),

    #[error("Invalid Ctrl mapping for {key}: {source}")]
    InvalidCtrlMapping {
        key: String,
        #[source]
        source: CtrlMappingError,
    },

    #[error("Invalid multi-tap entry: {0}")]
    InvalidMultiTap(String),

    #[error("Timeout value out of range: {0}")]
    TimeoutOutOfRange(String),
}

/// Main configuration structure (root TOML table)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    #[serde(default)]
    pub general: Option<GeneralConfig>,

    #[serde(default)]
    pub timeouts: Option<TimeoutConfig>,

    /// Character layout; absent means built-in QWERTY
    #[serde(default)]
    pub layout: Option<LayoutConfig>,

    #[serde(default)]
    pub multitap: Option<MultiTapConfig>,

    /// Ctrl table; absent means the standard table
    #[serde(default)]
    pub ctrl: Option<IndexMap<String, CtrlEntry>>,

    /// SYM pages; absent means the standard pages
    #[serde(default)]
    pub sym: Option<SymConfig>,

    /// Nav mode map; absent means ESDF/IJKL + T
    #[serde(default)]
    pub nav: Option<IndexMap<String, String>>,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    pub name: Option<String>,
    /// Key that cycles the SYM pages
    pub sym_key: Option<String>,
}

/// Timeouts configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    pub multi_tap_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// "qwerty" (default) to start from the built-in layout, "none" to start empty
    pub base: Option<String>,

    #[serde(default)]
    pub keys: IndexMap<String, KeyCharsEntry>,
}

/// `q = "q"` or `q = { plain = "q", alt = "0" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyCharsEntry {
    Plain(String),
    Full(KeyCharsToml),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct KeyCharsToml {
    pub plain: Option<String>,
    pub shift: Option<String>,
    pub alt: Option<String>,
    pub alt_shift: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MultiTapConfig {
    /// Keys whose variants come from the layout
    #[serde(default)]
    pub keys: Vec<String>,

    /// Keys with an explicit variant list
    #[serde(default)]
    pub variants: IndexMap<String, Vec<String>>,
}

/// `c = { type = "action", value = "copy" }`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CtrlEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SymConfig {
    #[serde(default)]
    pub page1: IndexMap<String, String>,
    #[serde(default)]
    pub page2: IndexMap<String, String>,
}

/// Validated keyboard configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub name: Option<String>,
    pub sym_key: Key,
    pub multi_tap_window: Duration,
    pub layout: KeyLayout,
    pub multi_tap: MultiTapTable,
    pub ctrl_table: CtrlTable,
    pub sym_layers: SymLayers,
    pub nav_map: NavMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            sym_key: Key::SYM,
            multi_tap_window: DEFAULT_MULTI_TAP_WINDOW,
            layout: KeyLayout::qwerty(),
            multi_tap: MultiTapTable::new(),
            ctrl_table: CtrlTable::standard(),
            sym_layers: SymLayers::standard(),
            nav_map: NavMap::default(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// Router configuration combining these tables with user settings
    pub fn router_config(&self, settings: Settings) -> RouterConfig {
        RouterConfig {
            settings,
            ctrl_table: self.ctrl_table.clone(),
            sym_layers: self.sym_layers.clone(),
            multi_tap: self.multi_tap.clone(),
            nav_map: self.nav_map.clone(),
            sym_key: self.sym_key,
            multi_tap_window: self.multi_tap_window,
        }
    }

    /// Router over this layout with the built-in timer queue
    pub fn build_router(&self, settings: Settings) -> InputEventRouter {
        InputEventRouter::new(self.router_config(settings), self.layout.clone())
    }
}

impl ConfigToml {
    /// Convert TOML config to validated Config
    fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(general) = &self.general {
            config.name = general.name.clone();
            if let Some(sym_key) = &general.sym_key {
                config.sym_key = parse_key(sym_key)?;
            }
        }

        if let Some(multi_tap_ms) = self.timeouts.as_ref().and_then(|t| t.multi_tap_ms) {
            if !(50..=2000).contains(&multi_tap_ms) {
                return Err(ConfigError::TimeoutOutOfRange(format!(
                    "multi_tap_ms must be 50-2000ms, got {}",
                    multi_tap_ms
                )));
            }
            config.multi_tap_window = Duration::from_millis(multi_tap_ms);
        }

        if let Some(layout) = &self.layout {
            config.layout = parse_layout(layout)?;
        }

        if let Some(multitap) = &self.multitap {
            config.multi_tap = parse_multi_tap(multitap, &config.layout)?;
        }

        if let Some(ctrl) = &self.ctrl {
            config.ctrl_table = parse_ctrl_table(ctrl)?;
        }

        if let Some(sym) = &self.sym {
            let mut layers = SymLayers::new();
            for (page, entries) in [(SymPage::Page1, &sym.page1), (SymPage::Page2, &sym.page2)] {
                for (name, glyph) in entries {
                    if glyph.is_empty() {
                        return Err(ConfigError::InvalidChar(format!("empty SYM glyph for {}", name)));
                    }
                    layers.insert(page, parse_key(name)?, glyph.as_str());
                }
            }
            config.sym_layers = layers;
        }

        if let Some(nav) = &self.nav {
            let mut map = NavMap::empty();
            for (name, target) in nav {
                map.insert(parse_key(name)?, parse_key(target)?);
            }
            config.nav_map = map;
        }

        log::debug!(
            "config {:?}: {} layout keys, {} multi-tap keys, {} Ctrl entries",
            config.name,
            config.layout.len(),
            config.multi_tap.len(),
            config.ctrl_table.len()
        );
        Ok(config)
    }
}

fn parse_layout(layout: &LayoutConfig) -> Result<KeyLayout, ConfigError> {
    let mut result = match layout.base.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("qwerty") => KeyLayout::qwerty(),
        Some("none") | Some("empty") => KeyLayout::new(),
        Some(other) => {
            return Err(ConfigError::InvalidKey(format!("unknown layout base '{}'", other)));
        }
    };

    for (name, entry) in &layout.keys {
        let key = parse_key(name)?;
        let chars = match entry {
            KeyCharsEntry::Plain(s) => KeyChars {
                plain: Some(parse_char(name, s)?),
                ..KeyChars::default()
            },
            KeyCharsEntry::Full(t) => KeyChars {
                plain: parse_opt_char(name, &t.plain)?,
                shift: parse_opt_char(name, &t.shift)?,
                alt: parse_opt_char(name, &t.alt)?,
                alt_shift: parse_opt_char(name, &t.alt_shift)?,
            },
        };
        result.insert(key, chars);
    }
    Ok(result)
}

fn parse_multi_tap(multitap: &MultiTapConfig, layout: &KeyLayout) -> Result<MultiTapTable, ConfigError> {
    let mut table = MultiTapTable::new();

    for name in &multitap.keys {
        let key = parse_key(name)?;
        if !table.insert_from_layout(key, layout) {
            return Err(ConfigError::InvalidMultiTap(format!(
                "{} has no characters in the layout",
                name
            )));
        }
    }

    for (name, variants) in &multitap.variants {
        let key = parse_key(name)?;
        if variants.is_empty() || variants.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidMultiTap(format!(
                "{} needs a non-empty list of non-empty variants",
                name
            )));
        }
        if table.contains(key) {
            log::warn!("multi-tap variants for {} override the derived list", name);
        }
        table.insert(key, variants.clone());
    }
    Ok(table)
}

fn parse_ctrl_table(entries: &IndexMap<String, CtrlEntry>) -> Result<CtrlTable, ConfigError> {
    let mut table = CtrlTable::new();
    for (name, entry) in entries {
        let key = parse_key(name)?;
        let mapping = CtrlMapping::parse(&entry.kind, &entry.value).map_err(|source| {
            ConfigError::InvalidCtrlMapping {
                key: name.clone(),
                source,
            }
        })?;
        if table.insert(key, mapping).is_some() {
            log::warn!("duplicate Ctrl entry for {}, last one wins", key);
        }
    }
    Ok(table)
}

/// Parse a key name, with helpful errors
fn parse_key(name: &str) -> Result<Key, ConfigError> {
    key_from_name(name).ok_or_else(|| ConfigError::InvalidKey(name.trim().to_string()))
}

fn parse_char(key: &str, s: &str) -> Result<char, ConfigError> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidChar(format!(
            "{}: expected a single character, got {:?}",
            key, s
        ))),
    }
}

fn parse_opt_char(key: &str, s: &Option<String>) -> Result<Option<char>, ConfigError> {
    s.as_deref().map(|s| parse_char(key, s)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctrl::{EditorAction, KeyKind};
    use crate::layout::LayoutLookup;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_builtins() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.sym_key, Key::SYM);
        assert_eq!(config.multi_tap_window, DEFAULT_MULTI_TAP_WINDOW);
        assert_eq!(config.ctrl_table, CtrlTable::standard());
        assert_eq!(config.layout.character(Key::Q, false), Some('q'));
        assert!(config.multi_tap.is_empty());
    }

    #[test]
    fn test_full_config() {
        let toml = r##"
[general]
name = "test board"
sym_key = "RIGHT_ALT"

[timeouts]
multi_tap_ms = 350

[layout.keys]
q = { plain = "q", alt = "#" }
"1" = "!"

[multitap]
keys = ["q"]

[multitap.variants]
k = ["k", "K", "κ"]

[ctrl]
c = { type = "action", value = "copy" }
j = { type = "keycode", value = "DPAD_LEFT" }

[sym.page1]
a = "@"

[nav]
h = "LEFT"
"##;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.name.as_deref(), Some("test board"));
        assert_eq!(config.sym_key, Key::RIGHT_ALT);
        assert_eq!(config.multi_tap_window, Duration::from_millis(350));
        assert_eq!(config.layout.alt_character(Key::Q, false), Some('#'));
        assert_eq!(config.layout.character(Key::from(2), false), Some('!'));

        let q: Vec<&str> = config.multi_tap.get(Key::Q).unwrap().iter().map(String::as_str).collect();
        assert_eq!(q, vec!["q", "Q", "#"]);
        assert_eq!(config.multi_tap.get(Key::K).unwrap().len(), 3);

        assert_eq!(config.ctrl_table.len(), 2);
        assert_eq!(config.ctrl_table.lookup(Key::C), Some(CtrlMapping::Action(EditorAction::Copy)));
        assert_eq!(config.ctrl_table.lookup(Key::J), Some(CtrlMapping::Keycode(KeyKind::DpadLeft)));

        assert_eq!(config.sym_layers.lookup(SymPage::Page1, Key::A), Some("@"));
        assert_eq!(config.sym_layers.page_len(SymPage::Page2), 0);
        assert_eq!(config.nav_map.get(Key::H), Some(Key::LEFT));
        assert_eq!(config.nav_map.get(Key::E), None);
    }

    #[test]
    fn test_invalid_ctrl_mapping() {
        let err = Config::from_toml("[ctrl]\nc = { type = \"action\", value = \"teleport\" }\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidCtrlMapping {
                source: CtrlMappingError::UnknownAction(_),
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_key_name() {
        assert!(matches!(
            Config::from_toml("[nav]\nbogus = \"UP\"\n"),
            Err(ConfigError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_multi_char_layout_entry() {
        assert!(matches!(
            Config::from_toml("[layout.keys]\nq = \"qq\"\n"),
            Err(ConfigError::InvalidChar(_))
        ));
    }

    #[test]
    fn test_multi_tap_timeout_range() {
        assert!(matches!(
            Config::from_toml("[timeouts]\nmulti_tap_ms = 10\n"),
            Err(ConfigError::TimeoutOutOfRange(_))
        ));
    }

    #[test]
    fn test_multi_tap_needs_layout_chars() {
        let toml = "[layout]\nbase = \"none\"\n\n[multitap]\nkeys = [\"q\"]\n";
        assert!(matches!(Config::from_toml(toml), Err(ConfigError::InvalidMultiTap(_))));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            Config::from_toml("[general]\nsuspend_key = \"F12\"\n"),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            Config::from_toml("[ctrl]\nc = { type = \"action\", value = \"copy\", extra = 1 }\n"),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_from_toml_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general]\nname = \"from file\"").unwrap();
        file.flush().unwrap();
        let config = Config::from_toml_path(file.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("from file"));

        assert!(matches!(
            Config::from_toml_path("/nonexistent/physkeys.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_router_config_carries_settings() {
        let config = Config::default();
        let mut settings = Settings::new();
        settings.sym_auto_close = false;
        let router_config = config.router_config(settings);
        assert!(!router_config.settings.sym_auto_close);
        assert_eq!(router_config.sym_key, Key::SYM);
    }
}
