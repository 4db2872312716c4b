// Physkeys Session State
// Everything one input session mutates, owned by the router

use std::collections::HashMap;
use std::time::Duration;

use crate::event::FieldContext;
use crate::mode::{NavModeController, SymPager};
use crate::resolve::{LongPressResolver, MultiTapResolver};
use crate::state::ModifierStateController;
use crate::timer::Scheduler;
use crate::transform::{Notification, RouterDecision};
use crate::Key;

#[derive(Debug)]
pub struct SessionState {
    pub modifiers: ModifierStateController,
    pub long_press: LongPressResolver,
    pub multi_tap: MultiTapResolver,
    pub sym: SymPager,
    pub nav: NavModeController,
    pub context: FieldContext,
    /// Key-down decisions, replayed on the matching key-up
    pub decisions: HashMap<Key, RouterDecision>,
    pub notifications: Vec<Notification>,
}

impl SessionState {
    pub fn new(long_press_threshold: Duration, multi_tap_window: Duration, nav_enabled: bool) -> Self {
        Self {
            modifiers: ModifierStateController::new(),
            long_press: LongPressResolver::new(long_press_threshold),
            multi_tap: MultiTapResolver::new(multi_tap_window),
            sym: SymPager::new(),
            nav: NavModeController::new(nav_enabled),
            context: FieldContext::default(),
            decisions: HashMap::new(),
            notifications: Vec::new(),
        }
    }

    /// Cancel every timer and drop pending presses, the open multi-tap cycle
    /// and recorded decisions
    pub fn clear_transient(&mut self, scheduler: &mut dyn Scheduler) {
        self.long_press.cancel_all(scheduler);
        self.multi_tap.finalize(scheduler);
        scheduler.cancel_all();
        self.decisions.clear();
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}
