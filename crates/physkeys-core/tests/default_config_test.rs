// Shipped configuration files must load and behave like the built-in tables

use std::path::PathBuf;
use std::time::Instant;

use physkeys_core::config::Config;
use physkeys_core::event::{replay, ReplayScript};
use physkeys_core::settings::{default_settings_content, Settings};
use physkeys_core::{CtrlTable, Key, LayoutLookup, NavMap, RouterDecision, SymLayers, TextBuffer};

fn configs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs")
}

#[test]
fn test_shipped_config_loads() {
    let config = Config::from_toml_path(configs_dir().join("physkeys.toml")).unwrap();
    assert_eq!(config.name.as_deref(), Some("qwerty-phone"));
    assert_eq!(config.sym_key, Key::SYM);
    assert_eq!(config.multi_tap_window.as_millis(), 400);
}

#[test]
fn test_shipped_config_mirrors_builtins() {
    let config = Config::from_toml_path(configs_dir().join("physkeys.toml")).unwrap();
    assert_eq!(config.ctrl_table, CtrlTable::standard());
    assert_eq!(config.nav_map, NavMap::default());
    assert_eq!(config.sym_layers, SymLayers::standard());

    assert_eq!(config.layout.character(Key::Q, false), Some('q'));
    assert_eq!(config.layout.alt_character(Key::Q, false), Some('0'));
    assert_eq!(config.layout.character(Key::DOT, true), Some('>'));
    assert_eq!(
        config.multi_tap.get(Key::DOT),
        Some(&[".".to_string(), ",".to_string(), "?".to_string(), "!".to_string()][..])
    );
}

#[test]
fn test_shipped_settings_match_defaults() {
    let settings = Settings::from_file(configs_dir().join("settings.toml")).unwrap();
    let defaults = Settings::new();
    assert_eq!(settings.long_press_threshold_ms(), defaults.long_press_threshold_ms());
    assert_eq!(settings.long_press_means_shift, defaults.long_press_means_shift);
    assert_eq!(settings.sym_auto_close, defaults.sym_auto_close);
    assert_eq!(settings.nav_mode_enabled, defaults.nav_mode_enabled);

    let generated = Settings::from_toml(default_settings_content()).unwrap();
    assert_eq!(generated.long_press_threshold_ms(), settings.long_press_threshold_ms());
}

#[test]
fn test_demo_script() {
    let config = Config::from_toml_path(configs_dir().join("physkeys.toml")).unwrap();
    let settings = Settings::from_file(configs_dir().join("settings.toml")).unwrap();
    let script = ReplayScript::from_file(configs_dir().join("demo-script.toml")).unwrap();

    let mut router = config.build_router(settings);
    let mut buffer = TextBuffer::new();
    let records = replay(&mut router, &mut buffer, &script, Instant::now());

    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts[1], "H");
    assert_eq!(texts[2], "Hi");
    assert_eq!(texts[4], "Hi0");
    assert_eq!(texts[6], "Hi0,");
    assert_eq!(texts[8], "Hi0,$");
    assert_eq!(texts[10], "Hi0,");

    let last = records.last().unwrap();
    assert_eq!(last.decision, Some(RouterDecision::PassThroughWithKeycode(Key::LEFT)));
    assert!(router.nav_mode_active());
    assert_eq!(buffer.text(), "Hi0,");
}
