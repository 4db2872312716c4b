// Physkeys Modifier System
// Logical modifiers (Shift, Ctrl, Alt) and their per-modifier bookkeeping

use std::fmt;
use std::time::{Duration, Instant};

use smallvec::SmallVec;
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::Key;

/// A logical modifier. Each one is fed by a left and a right physical key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, EnumIter, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
}

impl Modifier {
    pub const ALL: [Modifier; 3] = [Modifier::Shift, Modifier::Ctrl, Modifier::Alt];

    /// Physical keys that drive this modifier
    pub fn keys(self) -> &'static [Key] {
        match self {
            Modifier::Shift => &[Key::LEFT_SHIFT, Key::RIGHT_SHIFT],
            Modifier::Ctrl => &[Key::LEFT_CTRL, Key::RIGHT_CTRL],
            Modifier::Alt => &[Key::LEFT_ALT, Key::RIGHT_ALT],
        }
    }

    /// Get the modifier driven by a physical key
    pub fn from_key(key: Key) -> Option<Modifier> {
        Self::ALL.into_iter().find(|m| m.keys().contains(&key))
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Bookkeeping for one logical modifier.
///
/// Latch wins over one-shot when both are set. One-shot is cleared when a
/// character is committed under it, never on key-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierState {
    /// Physical keys of this group currently held down
    pressed_keys: SmallVec<[Key; 2]>,
    /// Applies to exactly the next committed character
    pub one_shot: bool,
    /// Stays active until toggled off (Caps Lock for Shift)
    pub latch_active: bool,
    pub last_press_time: Option<Instant>,
    pub last_release_time: Option<Instant>,
    /// Ctrl only: the latch exists solely to keep navigation mode active
    pub latch_from_nav_mode: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any physical key of the group is held
    pub fn physically_pressed(&self) -> bool {
        !self.pressed_keys.is_empty()
    }

    /// Held, latched or armed as one-shot
    pub fn is_active(&self) -> bool {
        self.physically_pressed() || self.latch_active || self.one_shot
    }

    /// Record a physical press; false if the key was already down (auto-repeat)
    pub(crate) fn press_key(&mut self, key: Key) -> bool {
        if self.pressed_keys.contains(&key) {
            return false;
        }
        self.pressed_keys.push(key);
        true
    }

    pub(crate) fn release_key(&mut self, key: Key) {
        self.pressed_keys.retain(|k| *k != key);
    }

    /// Whether a press at `now` completes a double tap
    pub fn within_double_tap(&self, now: Instant, threshold: Duration) -> bool {
        self.last_release_time
            .map(|released| now.saturating_duration_since(released) < threshold)
            .unwrap_or(false)
    }

    pub fn indicator(&self) -> ModifierIndicator {
        if self.latch_active {
            ModifierIndicator::Latched
        } else if self.physically_pressed() {
            ModifierIndicator::Held
        } else if self.one_shot {
            ModifierIndicator::OneShot
        } else {
            ModifierIndicator::Off
        }
    }

    /// Back to the all-clear state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What a status display would show for one modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModifierIndicator {
    #[default]
    Off,
    OneShot,
    Held,
    Latched,
}

/// Indicators of all three modifiers at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierSnapshot {
    pub shift: ModifierIndicator,
    pub ctrl: ModifierIndicator,
    pub alt: ModifierIndicator,
}

impl ModifierSnapshot {
    pub fn get(&self, modifier: Modifier) -> ModifierIndicator {
        match modifier {
            Modifier::Shift => self.shift,
            Modifier::Ctrl => self.ctrl,
            Modifier::Alt => self.alt,
        }
    }
}
