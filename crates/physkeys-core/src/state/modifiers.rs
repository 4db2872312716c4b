// Physkeys Modifier State Controller
// Double-tap latch promotion, one-shot arming and consumption for Shift/Ctrl/Alt

use std::time::{Duration, Instant};

use crate::modifier::{Modifier, ModifierSnapshot, ModifierState};
use crate::Key;

/// Second tap of the same modifier within this window toggles its latch
pub const DOUBLE_TAP_THRESHOLD: Duration = Duration::from_millis(500);

/// Nav mode change caused by a modifier event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavTransition {
    #[default]
    None,
    Entered,
    Exited,
}

/// Result of feeding a modifier key edge to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierOutcome {
    pub consume: bool,
    pub nav: NavTransition,
}

/// Owns the three modifier states
#[derive(Debug, Clone, Default)]
pub struct ModifierStateController {
    states: [ModifierState; 3],
}

impl ModifierStateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, modifier: Modifier) -> &ModifierState {
        &self.states[modifier.index()]
    }

    pub fn get_mut(&mut self, modifier: Modifier) -> &mut ModifierState {
        &mut self.states[modifier.index()]
    }

    /// Held, latched or one-shot
    pub fn is_active(&self, modifier: Modifier) -> bool {
        self.get(modifier).is_active()
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        self.get(modifier).physically_pressed()
    }

    /// Nav mode is the Ctrl latch while it is flagged as a nav latch
    pub fn nav_mode_active(&self) -> bool {
        let ctrl = self.get(Modifier::Ctrl);
        ctrl.latch_active && ctrl.latch_from_nav_mode
    }

    /// Feed a modifier key-down. Returns None if `key` is not a modifier key.
    ///
    /// `editable` tells whether a text field has focus; nav mode is only
    /// entered without one, and only when `nav_enabled`.
    pub fn on_key_down(
        &mut self,
        key: Key,
        now: Instant,
        editable: bool,
        nav_enabled: bool,
    ) -> Option<ModifierOutcome> {
        let modifier = Modifier::from_key(key)?;
        let state = self.get_mut(modifier);

        if !state.press_key(key) {
            // auto-repeat of a held modifier
            return Some(self.outcome(editable, NavTransition::None));
        }

        let mut nav = NavTransition::None;
        if state.within_double_tap(now, DOUBLE_TAP_THRESHOLD) {
            state.latch_active = !state.latch_active;
            state.one_shot = false;
            if modifier == Modifier::Ctrl {
                if state.latch_active && !editable && nav_enabled {
                    state.latch_from_nav_mode = true;
                    nav = NavTransition::Entered;
                } else if !state.latch_active && state.latch_from_nav_mode {
                    state.latch_from_nav_mode = false;
                    nav = NavTransition::Exited;
                }
            }
            log::debug!(
                "{} double tap: latch {}",
                modifier,
                if state.latch_active { "on" } else { "off" }
            );
        } else if state.latch_active {
            state.latch_active = false;
            state.one_shot = false;
            if state.latch_from_nav_mode {
                state.latch_from_nav_mode = false;
                nav = NavTransition::Exited;
            }
            log::debug!("{} tap: latch off", modifier);
        } else {
            state.one_shot = true;
            log::debug!("{} tap: one-shot armed", modifier);
        }
        state.last_press_time = Some(now);

        Some(self.outcome(editable, nav))
    }

    /// Feed a modifier key-up. One-shot state survives the release.
    pub fn on_key_up(&mut self, key: Key, now: Instant, editable: bool) -> Option<ModifierOutcome> {
        let modifier = Modifier::from_key(key)?;
        let state = self.get_mut(modifier);
        state.release_key(key);
        state.last_release_time = Some(now);
        Some(self.outcome(editable, NavTransition::None))
    }

    fn outcome(&self, editable: bool, nav: NavTransition) -> ModifierOutcome {
        ModifierOutcome {
            consume: editable || nav != NavTransition::None || self.nav_mode_active(),
            nav,
        }
    }

    /// Clear a one-shot after a character was committed under it
    pub fn consume_one_shot(&mut self, modifier: Modifier) -> bool {
        let state = self.get_mut(modifier);
        let was = state.one_shot;
        state.one_shot = false;
        was
    }

    /// Latch Ctrl as a nav latch
    pub fn enter_nav_latch(&mut self) {
        let ctrl = self.get_mut(Modifier::Ctrl);
        ctrl.latch_active = true;
        ctrl.latch_from_nav_mode = true;
        ctrl.one_shot = false;
    }

    /// Drop a nav latch. Returns true if nav mode was active.
    pub fn exit_nav_latch(&mut self) -> bool {
        let was_active = self.nav_mode_active();
        let ctrl = self.get_mut(Modifier::Ctrl);
        if ctrl.latch_from_nav_mode {
            ctrl.latch_active = false;
            ctrl.latch_from_nav_mode = false;
        }
        was_active
    }

    /// Back to all clear, optionally keeping a nav latch
    pub fn reset(&mut self, preserve_nav_latch: bool) {
        let keep_nav = preserve_nav_latch && self.nav_mode_active();
        for state in self.states.iter_mut() {
            state.clear();
        }
        if keep_nav {
            self.enter_nav_latch();
        }
    }

    pub fn snapshot(&self) -> ModifierSnapshot {
        ModifierSnapshot {
            shift: self.get(Modifier::Shift).indicator(),
            ctrl: self.get(Modifier::Ctrl).indicator(),
            alt: self.get(Modifier::Alt).indicator(),
        }
    }
}
