// Physkeys Input Event Router
// Top-level key state machine: modifiers first, then the handler chain
//
// Every entry point runs synchronously on the caller's thread; the router is
// the only writer of session state. Timers are delivered back through
// `fire_timer` (or `advance_to` with the built-in queue) and checked for
// liveness before they act.

use std::time::{Duration, Instant};

use crate::ctrl::CtrlTable;
use crate::event::{FieldContext, KeyEvent};
use crate::layout::{KeyLayout, LayoutLookup};
use crate::mode::{NavMap, SymLayers, SymPage};
use crate::modifier::ModifierSnapshot;
use crate::output::CommitSink;
use crate::resolve::{MultiTapTable, DEFAULT_MULTI_TAP_WINDOW};
use crate::settings::Settings;
use crate::state::{NavTransition, SessionState};
use crate::timer::{Scheduler, TimerKind, TimerQueue, TimerToken};
use crate::transform::handlers::{default_handlers, HandlerContext, KeyHandler};
use crate::transform::{Notification, RouterDecision};
use crate::{Key, Modifier};

/// Tables and toggles the router runs with
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub settings: Settings,
    pub ctrl_table: CtrlTable,
    pub sym_layers: SymLayers,
    pub multi_tap: MultiTapTable,
    pub nav_map: NavMap,
    /// Key that cycles the SYM pages
    pub sym_key: Key,
    pub multi_tap_window: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            settings: Settings::new(),
            ctrl_table: CtrlTable::standard(),
            sym_layers: SymLayers::standard(),
            multi_tap: MultiTapTable::new(),
            nav_map: NavMap::default(),
            sym_key: Key::SYM,
            multi_tap_window: DEFAULT_MULTI_TAP_WINDOW,
        }
    }
}

/// Observable state compared before and after each entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    modifiers: ModifierSnapshot,
    sym: SymPage,
    nav: bool,
}

pub struct InputEventRouter<S: Scheduler = TimerQueue> {
    config: RouterConfig,
    layout: Box<dyn LayoutLookup>,
    handlers: Vec<Box<dyn KeyHandler>>,
    state: SessionState,
    scheduler: S,
}

impl InputEventRouter<TimerQueue> {
    /// Router driven by the built-in deterministic timer queue
    pub fn new(config: RouterConfig, layout: impl LayoutLookup + 'static) -> Self {
        Self::with_scheduler(config, layout, TimerQueue::new())
    }

    /// Fire every timer due at or before `now`, earliest first. Returns how
    /// many timers fired.
    pub fn advance_to(&mut self, now: Instant, sink: &mut dyn CommitSink) -> usize {
        let mut fired = 0;
        while let Some(due) = self.scheduler.pop_due(now) {
            self.fire_timer(due.token, due.kind, sink);
            fired += 1;
        }
        fired
    }
}

impl Default for InputEventRouter<TimerQueue> {
    fn default() -> Self {
        Self::new(RouterConfig::default(), KeyLayout::qwerty())
    }
}

impl<S: Scheduler> InputEventRouter<S> {
    pub fn with_scheduler(config: RouterConfig, layout: impl LayoutLookup + 'static, scheduler: S) -> Self {
        let state = SessionState::new(
            config.settings.long_press_threshold(),
            config.multi_tap_window,
            config.settings.nav_mode_enabled,
        );
        Self {
            config,
            layout: Box::new(layout),
            handlers: default_handlers(),
            state,
            scheduler,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Swap in new settings; takes effect for the next press
    pub fn set_settings(&mut self, settings: Settings) {
        self.state.long_press.set_threshold(settings.long_press_threshold());
        self.state.nav.set_enabled(settings.nav_mode_enabled);
        self.config.settings = settings;
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn field_context(&self) -> FieldContext {
        self.state.context
    }

    pub fn sym_page(&self) -> SymPage {
        self.state.sym.page()
    }

    pub fn nav_mode_active(&self) -> bool {
        self.state.modifiers.nav_mode_active()
    }

    pub fn modifier_snapshot(&self) -> ModifierSnapshot {
        self.state.modifiers.snapshot()
    }

    /// Drain queued notifications, oldest first
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.state.notifications)
    }

    /// Route one raw event
    pub fn process_event(&mut self, event: &KeyEvent, sink: &mut dyn CommitSink) -> RouterDecision {
        if event.action.is_down() {
            self.on_key_down(event, sink)
        } else {
            self.on_key_up(event, sink)
        }
    }

    /// Key-down (including auto-repeat)
    pub fn on_key_down(&mut self, event: &KeyEvent, sink: &mut dyn CommitSink) -> RouterDecision {
        let before = self.observe();
        let key = event.key;

        let decision = match Modifier::from_key(key) {
            Some(modifier) => self.modifier_down(modifier, event),
            None => {
                // text committed for other held keys is final from here on
                self.state.long_press.settle_others(key, &mut self.scheduler);
                if let Some(active) = self.state.multi_tap.active_key() {
                    if active != key {
                        self.state.multi_tap.finalize(&mut self.scheduler);
                    }
                }
                self.run_handlers(event, sink)
            }
        };

        log::debug!("{} {} -> {:?}", key, event.action, decision);
        self.state.decisions.insert(key, decision);
        self.publish_changes(before);
        decision
    }

    /// Key-up: mirrors whatever the key-down decided
    pub fn on_key_up(&mut self, event: &KeyEvent, _sink: &mut dyn CommitSink) -> RouterDecision {
        let before = self.observe();
        let key = event.key;

        let fallback = match self.state.modifiers.on_key_up(key, event.time, self.state.context.editable) {
            Some(outcome) if outcome.consume => RouterDecision::Consume,
            Some(_) => RouterDecision::PassThrough,
            None => {
                if let Some(long_press) = self.state.long_press.on_key_up(key, &mut self.scheduler) {
                    log::trace!("{} released, long press activated: {}", key, long_press);
                }
                RouterDecision::PassThrough
            }
        };
        let decision = self.state.decisions.remove(&key).unwrap_or(fallback);

        self.publish_changes(before);
        decision
    }

    /// Deliver a timer. Stale or cancelled timers are ignored.
    pub fn fire_timer(&mut self, token: TimerToken, kind: TimerKind, sink: &mut dyn CommitSink) {
        let before = self.observe();
        match kind {
            TimerKind::LongPress(key) => {
                if let Some(text) = self.state.long_press.on_timer(key, token, sink) {
                    // the alternate replaced the cycle's text; a further tap starts over
                    if self.state.multi_tap.active_key() == Some(key) {
                        self.state.multi_tap.finalize(&mut self.scheduler);
                    }
                    self.state
                        .notify(Notification::AltCharacterInserted { key, text });
                }
            }
            TimerKind::MultiTapWindow(key) => {
                self.state.multi_tap.on_window_expired(key, token);
            }
        }
        self.publish_changes(before);
    }

    /// The host moved focus. Editable focus ends nav mode (remembering it);
    /// leaving the field brings it back.
    pub fn on_focus_changed(&mut self, context: FieldContext) {
        let before = self.observe();
        if context.editable {
            self.state.nav.on_field_focused(&mut self.state.modifiers);
            self.clear_session(false);
        } else {
            self.clear_session(true);
            if self.state.context.editable {
                self.state.nav.on_field_blurred(&mut self.state.modifiers);
            }
        }
        self.state.context = context;
        log::debug!("focus changed: {:?}", context);
        self.publish_changes(before);
    }

    /// Back to all clear: timers, pending presses, SYM page and modifiers.
    /// With `preserve_nav_latch` an active nav mode survives.
    pub fn reset_context(&mut self, preserve_nav_latch: bool) {
        let before = self.observe();
        self.clear_session(preserve_nav_latch);
        self.publish_changes(before);
    }

    /// The keyboard window went away
    pub fn on_window_hidden(&mut self) {
        self.reset_context(true);
    }

    /// Leaving for another screen: remember the SYM page, then reset
    pub fn suspend_for_interruption(&mut self) {
        let before = self.observe();
        self.state.sym.close_for_interruption();
        self.clear_session(true);
        self.publish_changes(before);
    }

    /// Back from an interruption. Returns the reopened page, once.
    pub fn restore_sym_page(&mut self) -> Option<SymPage> {
        let before = self.observe();
        let page = self.state.sym.restore_last_page();
        self.publish_changes(before);
        page
    }

    fn clear_session(&mut self, preserve_nav_latch: bool) {
        self.state.clear_transient(&mut self.scheduler);
        self.state.sym.close();
        self.state.modifiers.reset(preserve_nav_latch);
    }

    fn modifier_down(&mut self, modifier: Modifier, event: &KeyEvent) -> RouterDecision {
        let editable = self.state.context.editable;
        let outcome = self.state.modifiers.on_key_down(
            event.key,
            event.time,
            editable,
            self.state.nav.enabled(),
        );
        let Some(outcome) = outcome else {
            return RouterDecision::PassThrough;
        };

        match outcome.nav {
            NavTransition::Entered => {
                self.state.nav.on_entered();
                log::debug!("nav mode entered");
            }
            NavTransition::Exited => {
                self.state.nav.exit(&mut self.state.modifiers);
                log::debug!("nav mode exited");
            }
            NavTransition::None => {}
        }

        if modifier == Modifier::Alt && event.action.just_pressed() && self.state.sym.is_open() {
            let held = self.state.modifiers.is_held(Modifier::Ctrl)
                || self.state.modifiers.is_held(Modifier::Shift)
                || event.meta.ctrl
                || event.meta.shift;
            self.state
                .sym
                .close_if_auto_close(self.config.settings.sym_auto_close, held);
        }

        if outcome.consume {
            RouterDecision::Consume
        } else {
            RouterDecision::PassThrough
        }
    }

    fn run_handlers(&mut self, event: &KeyEvent, sink: &mut dyn CommitSink) -> RouterDecision {
        let mut cx = HandlerContext {
            event,
            state: &mut self.state,
            config: &self.config,
            layout: self.layout.as_ref(),
            sink,
            scheduler: &mut self.scheduler,
        };
        for handler in &self.handlers {
            if let Some(decision) = handler.try_handle(&mut cx) {
                log::trace!("{} claimed by {}", event.key, handler.name());
                return decision;
            }
        }
        RouterDecision::PassThrough
    }

    fn observe(&self) -> Observed {
        Observed {
            modifiers: self.state.modifiers.snapshot(),
            sym: self.state.sym.page(),
            nav: self.state.modifiers.nav_mode_active(),
        }
    }

    fn publish_changes(&mut self, before: Observed) {
        let after = self.observe();
        if after.nav != before.nav {
            self.state.notify(Notification::NavModeChanged(after.nav));
        }
        if after.sym != before.sym {
            self.state.notify(Notification::SymPageChanged(after.sym));
        }
        if after.modifiers != before.modifiers {
            self.state.notify(Notification::ModifiersChanged(after.modifiers));
        }
    }
}

impl<S: Scheduler + std::fmt::Debug> std::fmt::Debug for InputEventRouter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputEventRouter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
