// Physkeys Nav Mode
// Letter keys drive UI navigation while no text field has focus

use std::collections::HashMap;

use crate::state::ModifierStateController;
use crate::Key;

/// Letter key -> navigation key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMap {
    map: HashMap<Key, Key>,
}

impl Default for NavMap {
    /// ESDF and IJKL as arrow clusters, T as Tab
    fn default() -> Self {
        let mut nav = Self::empty();
        for (key, target) in [
            (Key::E, Key::UP),
            (Key::S, Key::LEFT),
            (Key::D, Key::DOWN),
            (Key::F, Key::RIGHT),
            (Key::I, Key::UP),
            (Key::J, Key::LEFT),
            (Key::K, Key::DOWN),
            (Key::L, Key::RIGHT),
            (Key::T, Key::TAB),
        ] {
            nav.insert(key, target);
        }
        nav
    }
}

impl NavMap {
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    pub fn insert(&mut self, key: Key, target: Key) {
        self.map.insert(key, target);
    }

    pub fn get(&self, key: Key) -> Option<Key> {
        self.map.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Nav mode bookkeeping that is not derived from the Ctrl latch.
///
/// Active/inactive lives in the modifier controller; this only remembers
/// whether a text-field focus forced nav mode off so it can come back when
/// that field loses focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavModeController {
    enabled: bool,
    restore_on_blur: bool,
}

impl NavModeController {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            restore_on_blur: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn restore_pending(&self) -> bool {
        self.restore_on_blur
    }

    /// Nav mode was entered by the user
    pub fn on_entered(&mut self) {
        self.restore_on_blur = false;
    }

    /// An editable field gained focus: nav mode ends unconditionally.
    /// Returns true if it was active.
    pub fn on_field_focused(&mut self, modifiers: &mut ModifierStateController) -> bool {
        let was_active = modifiers.exit_nav_latch();
        if was_active {
            self.restore_on_blur = true;
            log::debug!("nav mode suspended by text field focus");
        }
        was_active
    }

    /// The editable field lost focus: re-enter nav mode if a focus change
    /// took it away. Returns true if nav mode came back.
    pub fn on_field_blurred(&mut self, modifiers: &mut ModifierStateController) -> bool {
        if !std::mem::take(&mut self.restore_on_blur) || !self.enabled {
            return false;
        }
        modifiers.enter_nav_latch();
        log::debug!("nav mode restored after text field blur");
        true
    }

    /// Explicit exit (Back or Ctrl). Returns true if nav mode was active.
    pub fn exit(&mut self, modifiers: &mut ModifierStateController) -> bool {
        self.restore_on_blur = false;
        modifiers.exit_nav_latch()
    }

    pub fn remap(&self, key: Key, map: &NavMap) -> Option<Key> {
        map.get(key)
    }
}
