// Physkeys Key Handlers
// One handler per precedence step; the router asks them in order

use crate::ctrl::CtrlCommandDispatcher;
use crate::event::KeyEvent;
use crate::layout::LayoutLookup;
use crate::output::CommitSink;
use crate::state::SessionState;
use crate::timer::Scheduler;
use crate::transform::router::RouterConfig;
use crate::transform::RouterDecision;
use crate::{Key, Modifier};

/// Everything a handler may read or mutate while deciding one key-down
pub struct HandlerContext<'a> {
    pub event: &'a KeyEvent,
    pub state: &'a mut SessionState,
    pub config: &'a RouterConfig,
    pub layout: &'a dyn LayoutLookup,
    pub sink: &'a mut dyn CommitSink,
    pub scheduler: &'a mut dyn Scheduler,
}

impl HandlerContext<'_> {
    pub fn key(&self) -> Key {
        self.event.key
    }

    /// Tracked state or the host's meta flag
    pub fn modifier_active(&self, modifier: Modifier) -> bool {
        let meta = match modifier {
            Modifier::Shift => self.event.meta.shift,
            Modifier::Ctrl => self.event.meta.ctrl,
            Modifier::Alt => self.event.meta.alt,
        };
        meta || self.state.modifiers.is_active(modifier)
    }

    /// Physically held, by our tracking or the host's
    pub fn modifier_held(&self, modifier: Modifier) -> bool {
        let meta = match modifier {
            Modifier::Shift => self.event.meta.shift,
            Modifier::Ctrl => self.event.meta.ctrl,
            Modifier::Alt => self.event.meta.alt,
        };
        meta || self.state.modifiers.is_held(modifier)
    }

    fn commit_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.sink.commit_text(c.encode_utf8(&mut buf));
    }
}

/// One step of the key-down precedence chain
pub trait KeyHandler: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Claim the event by returning a decision, or pass it down the chain
    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision>;
}

/// Handlers in precedence order
pub fn default_handlers() -> Vec<Box<dyn KeyHandler>> {
    vec![
        Box::new(BackKeyHandler),
        Box::new(UnfocusedHandler),
        Box::new(SymHandler),
        Box::new(AltHandler),
        Box::new(CtrlHandler),
        Box::new(PressResolutionHandler),
        Box::new(ShiftOneShotHandler),
        Box::new(CapsLockHandler),
        Box::new(PlainHandler),
    ]
}

/// Back closes nav mode or the SYM page
#[derive(Debug)]
pub struct BackKeyHandler;

impl KeyHandler for BackKeyHandler {
    fn name(&self) -> &'static str {
        "back"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        if cx.key() != Key::BACK {
            return None;
        }
        let state = &mut *cx.state;
        if state.nav.exit(&mut state.modifiers) {
            log::debug!("Back: nav mode exited");
            return Some(RouterDecision::Consume);
        }
        if state.sym.close() {
            log::debug!("Back: SYM page closed");
        }
        Some(RouterDecision::PassThrough)
    }
}

/// Without a text field only nav mode and launcher shortcuts act
#[derive(Debug)]
pub struct UnfocusedHandler;

impl KeyHandler for UnfocusedHandler {
    fn name(&self) -> &'static str {
        "unfocused"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        if cx.state.context.editable {
            return None;
        }
        let key = cx.key();

        if cx.state.context.launcher
            && key.is_alphabetic()
            && cx.event.action.just_pressed()
            && cx.sink.launch_shortcut(key)
        {
            log::debug!("launcher shortcut {}", key);
            return Some(RouterDecision::Consume);
        }

        if cx.state.modifiers.nav_mode_active() {
            if key == Key::ENTER {
                // activates whatever the nav keys moved to
                return Some(RouterDecision::PassThrough);
            }
            return Some(match cx.state.nav.remap(key, &cx.config.nav_map) {
                Some(target) => RouterDecision::PassThroughWithKeycode(target),
                None => RouterDecision::Consume,
            });
        }

        Some(RouterDecision::PassThrough)
    }
}

/// SYM key cycling and glyph lookup on the open page
#[derive(Debug)]
pub struct SymHandler;

impl KeyHandler for SymHandler {
    fn name(&self) -> &'static str {
        "sym"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        let key = cx.key();
        let auto_close = cx.config.settings.sym_auto_close;

        if key == cx.config.sym_key {
            if cx.event.action.just_pressed() {
                cx.state.sym.on_sym_key_down();
                // a press held across the page change must not swap its character later
                cx.state.long_press.cancel_all(cx.scheduler);
                cx.state.multi_tap.finalize(cx.scheduler);
            }
            return Some(RouterDecision::Consume);
        }

        let page = cx.state.sym.page();
        if !page.is_open() {
            return None;
        }

        if key == Key::ENTER {
            let held = cx.modifier_held(Modifier::Ctrl) || cx.modifier_held(Modifier::Shift);
            cx.state.sym.close_if_auto_close(auto_close, held);
            return None;
        }

        let glyph = cx.config.sym_layers.lookup(page, key)?.to_string();
        cx.sink.commit_text(&glyph);
        let held = Modifier::ALL.iter().any(|m| cx.modifier_held(*m));
        cx.state.sym.close_if_auto_close(auto_close, held);
        Some(RouterDecision::Consume)
    }
}

/// Alt layer characters; Alt+Space is a plain space
#[derive(Debug)]
pub struct AltHandler;

impl KeyHandler for AltHandler {
    fn name(&self) -> &'static str {
        "alt"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        if !cx.modifier_active(Modifier::Alt) {
            return None;
        }
        let key = cx.key();

        if key == Key::SPACE {
            cx.sink.commit_text(" ");
            cx.state.modifiers.consume_one_shot(Modifier::Alt);
            return Some(RouterDecision::Consume);
        }

        let shift = cx.modifier_active(Modifier::Shift);
        let c = cx.layout.alt_character(key, shift)?;
        cx.commit_char(c);
        cx.state.modifiers.consume_one_shot(Modifier::Alt);
        if shift {
            cx.state.modifiers.consume_one_shot(Modifier::Shift);
        }
        Some(RouterDecision::Consume)
    }
}

/// Ctrl combinations through the Ctrl table
#[derive(Debug)]
pub struct CtrlHandler;

impl KeyHandler for CtrlHandler {
    fn name(&self) -> &'static str {
        "ctrl"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        if !cx.modifier_active(Modifier::Ctrl) {
            return None;
        }
        if CtrlCommandDispatcher::dispatch(cx.key(), &cx.config.ctrl_table, cx.sink) {
            cx.state.modifiers.consume_one_shot(Modifier::Ctrl);
            Some(RouterDecision::Consume)
        } else {
            Some(RouterDecision::PassThrough)
        }
    }
}

/// Multi-tap cycling and long-press arming
#[derive(Debug)]
pub struct PressResolutionHandler;

impl PressResolutionHandler {
    /// Character a long press on `key` turns into
    fn long_press_variant(cx: &HandlerContext<'_>, key: Key, shift: bool) -> Option<char> {
        if cx.config.settings.long_press_means_shift {
            cx.layout.character(key, true)
        } else {
            cx.layout.alt_character(key, shift)
        }
    }
}

impl KeyHandler for PressResolutionHandler {
    fn name(&self) -> &'static str {
        "press-resolution"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        let key = cx.key();
        let now = cx.event.time;

        if cx.state.long_press.is_pending(key) {
            // auto-repeat of a key whose character is still being resolved
            return Some(RouterDecision::Consume);
        }

        if !cx.state.context.smart_features_disabled {
            if let Some(variants) = cx.config.multi_tap.get(key) {
                if cx.event.action.is_repeat() {
                    return Some(RouterDecision::Consume);
                }
                cx.state
                    .multi_tap
                    .handle_tap(key, variants, now, cx.sink, cx.scheduler);
                let committed = cx
                    .state
                    .multi_tap
                    .current()
                    .map(|cycle| cycle.committed.clone())
                    .unwrap_or_default();
                if let Some(alt) = Self::long_press_variant(cx, key, false) {
                    let alt = alt.to_string();
                    if alt != committed {
                        cx.state.long_press.arm(key, &committed, &alt, now, cx.scheduler);
                    }
                }
                return Some(RouterDecision::Consume);
            }
        }

        let shift = cx.modifier_active(Modifier::Shift);
        let plain = cx.layout.character(key, shift)?;
        let alternate = Self::long_press_variant(cx, key, shift)?;
        if alternate == plain {
            return None;
        }

        let (plain, alternate) = (plain.to_string(), alternate.to_string());
        cx.state
            .long_press
            .on_key_down(key, &plain, &alternate, now, cx.sink, cx.scheduler);
        cx.state.modifiers.consume_one_shot(Modifier::Shift);
        Some(RouterDecision::Consume)
    }
}

/// Shift held or armed as one-shot
#[derive(Debug)]
pub struct ShiftOneShotHandler;

impl KeyHandler for ShiftOneShotHandler {
    fn name(&self) -> &'static str {
        "shift"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        let shift = cx.state.modifiers.get(Modifier::Shift);
        if !(shift.one_shot || cx.modifier_held(Modifier::Shift)) {
            return None;
        }
        let c = cx.layout.character(cx.key(), true)?;
        cx.commit_char(c);
        cx.state.modifiers.consume_one_shot(Modifier::Shift);
        Some(RouterDecision::Consume)
    }
}

/// Shift latch
#[derive(Debug)]
pub struct CapsLockHandler;

impl KeyHandler for CapsLockHandler {
    fn name(&self) -> &'static str {
        "caps-lock"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        if !cx.state.modifiers.get(Modifier::Shift).latch_active {
            return None;
        }
        let c = cx.layout.character(cx.key(), true)?;
        cx.commit_char(c);
        Some(RouterDecision::Consume)
    }
}

/// Layout character, or the host's default handling for unmapped keys
#[derive(Debug)]
pub struct PlainHandler;

impl KeyHandler for PlainHandler {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn try_handle(&self, cx: &mut HandlerContext<'_>) -> Option<RouterDecision> {
        match cx.layout.character(cx.key(), false) {
            Some(c) => {
                cx.commit_char(c);
                Some(RouterDecision::Consume)
            }
            None => Some(RouterDecision::PassThrough),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::FieldContext;
    use crate::layout::KeyLayout;
    use crate::output::TextBuffer;
    use crate::timer::TimerQueue;
    use std::time::Instant;

    struct Fixture {
        state: SessionState,
        config: RouterConfig,
        layout: KeyLayout,
        buffer: TextBuffer,
        queue: TimerQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let config = RouterConfig::default();
            let mut state = SessionState::new(
                config.settings.long_press_threshold(),
                config.multi_tap_window,
                true,
            );
            state.context = FieldContext::text();
            Self {
                state,
                config,
                layout: KeyLayout::qwerty(),
                buffer: TextBuffer::new(),
                queue: TimerQueue::new(),
            }
        }

        fn run(&mut self, handler: &dyn KeyHandler, key: Key) -> Option<RouterDecision> {
            let event = KeyEvent::press(key, Instant::now());
            let mut cx = HandlerContext {
                event: &event,
                state: &mut self.state,
                config: &self.config,
                layout: &self.layout,
                sink: &mut self.buffer,
                scheduler: &mut self.queue,
            };
            handler.try_handle(&mut cx)
        }
    }

    #[test]
    fn test_handler_order() {
        let names: Vec<&str> = default_handlers().iter().map(|h| h.name()).collect();
        assert_eq!(
            names,
            vec!["back", "unfocused", "sym", "alt", "ctrl", "press-resolution", "shift", "caps-lock", "plain"]
        );
    }

    #[test]
    fn test_back_ignores_other_keys() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(&BackKeyHandler, Key::A), None);
        assert_eq!(fx.run(&BackKeyHandler, Key::BACK), Some(RouterDecision::PassThrough));
    }

    #[test]
    fn test_unfocused_only_without_field() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(&UnfocusedHandler, Key::A), None);
        fx.state.context = FieldContext::none();
        assert_eq!(fx.run(&UnfocusedHandler, Key::A), Some(RouterDecision::PassThrough));
        fx.state.modifiers.enter_nav_latch();
        assert_eq!(
            fx.run(&UnfocusedHandler, Key::J),
            Some(RouterDecision::PassThroughWithKeycode(Key::LEFT))
        );
        assert_eq!(fx.run(&UnfocusedHandler, Key::Q), Some(RouterDecision::Consume));
        assert_eq!(fx.run(&UnfocusedHandler, Key::ENTER), Some(RouterDecision::PassThrough));
    }

    #[test]
    fn test_sym_closed_passes() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(&SymHandler, Key::D), None);
        fx.state.sym.on_sym_key_down();
        assert_eq!(fx.run(&SymHandler, Key::D), Some(RouterDecision::Consume));
        assert_eq!(fx.buffer.text(), "$");
    }

    #[test]
    fn test_alt_falls_through_when_unmapped() {
        let mut fx = Fixture::new();
        fx.state.modifiers.get_mut(Modifier::Alt).one_shot = true;
        assert_eq!(fx.run(&AltHandler, Key::ENTER), None);
        assert!(fx.state.modifiers.get(Modifier::Alt).one_shot);
        assert_eq!(fx.run(&AltHandler, Key::W), Some(RouterDecision::Consume));
        assert_eq!(fx.buffer.text(), "1");
        assert!(!fx.state.modifiers.get(Modifier::Alt).one_shot);
    }

    #[test]
    fn test_alt_space_is_literal() {
        let mut fx = Fixture::new();
        fx.state.modifiers.get_mut(Modifier::Alt).latch_active = true;
        assert_eq!(fx.run(&AltHandler, Key::SPACE), Some(RouterDecision::Consume));
        assert_eq!(fx.buffer.text(), " ");
        // latch survives
        assert!(fx.state.modifiers.is_active(Modifier::Alt));
    }

    #[test]
    fn test_press_resolution_arms_timer() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(&PressResolutionHandler, Key::Q), Some(RouterDecision::Consume));
        assert_eq!(fx.buffer.text(), "q");
        assert_eq!(fx.queue.len(), 1);
        assert!(fx.queue.next_deadline().is_some());
        // space has no alternate
        assert_eq!(fx.run(&PressResolutionHandler, Key::SPACE), None);
    }

    #[test]
    fn test_caps_lock_keeps_latch() {
        let mut fx = Fixture::new();
        fx.state.modifiers.get_mut(Modifier::Shift).latch_active = true;
        assert_eq!(fx.run(&CapsLockHandler, Key::SPACE), Some(RouterDecision::Consume));
        assert_eq!(fx.run(&CapsLockHandler, Key::B), Some(RouterDecision::Consume));
        assert_eq!(fx.buffer.text(), " B");
        assert!(fx.state.modifiers.get(Modifier::Shift).latch_active);
    }

    #[test]
    fn test_plain_unmapped_passes_through() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(&PlainHandler, Key::ENTER), Some(RouterDecision::PassThrough));
        assert_eq!(fx.run(&PlainHandler, Key::B), Some(RouterDecision::Consume));
        assert_eq!(fx.buffer.text(), "b");
    }
}
