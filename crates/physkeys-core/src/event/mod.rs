// Physkeys Events
// Raw key events, host meta state and the focused-field context

pub mod replay;

use std::time::Instant;

use crate::{Key, KeyAction};

pub use replay::{replay, ReplayRecord, ReplayScript, ScriptError, Step, StepKind};

/// Modifier flags the host reports as physically held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MetaState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl MetaState {
    pub const NONE: MetaState = MetaState {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }
}

/// One hardware key edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub action: KeyAction,
    pub time: Instant,
    pub meta: MetaState,
}

impl KeyEvent {
    pub fn new(key: Key, action: KeyAction, time: Instant) -> Self {
        Self {
            key,
            action,
            time,
            meta: MetaState::NONE,
        }
    }

    pub fn press(key: Key, time: Instant) -> Self {
        Self::new(key, KeyAction::Press, time)
    }

    pub fn release(key: Key, time: Instant) -> Self {
        Self::new(key, KeyAction::Release, time)
    }

    pub fn repeat(key: Key, time: Instant) -> Self {
        Self::new(key, KeyAction::Repeat, time)
    }

    pub fn with_meta(mut self, meta: MetaState) -> Self {
        self.meta = meta;
        self
    }
}

/// What currently has input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldContext {
    /// An editable text field is focused
    pub editable: bool,
    /// Password-like field: no multi-tap cycling
    pub smart_features_disabled: bool,
    /// A launcher with app shortcuts is in front
    pub launcher: bool,
}

impl FieldContext {
    /// Nothing editable focused
    pub fn none() -> Self {
        Self::default()
    }

    /// Ordinary text field
    pub fn text() -> Self {
        Self {
            editable: true,
            ..Self::default()
        }
    }

    pub fn password() -> Self {
        Self {
            editable: true,
            smart_features_disabled: true,
            launcher: false,
        }
    }

    pub fn launcher() -> Self {
        Self {
            launcher: true,
            ..Self::default()
        }
    }
}
