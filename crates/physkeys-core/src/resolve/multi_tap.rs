// Physkeys Multi-Tap
// Repeated taps of one key cycle through its character variants

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::layout::LayoutLookup;
use crate::output::CommitSink;
use crate::timer::{Scheduler, TimerKind, TimerToken};
use crate::Key;

/// Default tap-cycle window
pub const DEFAULT_MULTI_TAP_WINDOW: Duration = Duration::from_millis(400);

/// The cycle in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiTapCycle {
    pub key: Key,
    pub tap_index: usize,
    /// Text currently on screen for this cycle
    pub committed: String,
    pub window_timer: Option<TimerToken>,
}

#[derive(Debug)]
pub struct MultiTapResolver {
    window: Duration,
    cycle: Option<MultiTapCycle>,
}

impl Default for MultiTapResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MULTI_TAP_WINDOW)
    }
}

impl MultiTapResolver {
    pub fn new(window: Duration) -> Self {
        Self { window, cycle: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn current(&self) -> Option<&MultiTapCycle> {
        self.cycle.as_ref()
    }

    pub fn active_key(&self) -> Option<Key> {
        self.cycle.as_ref().map(|cycle| cycle.key)
    }

    /// Handle one tap of `key`.
    ///
    /// A tap of the key whose cycle is still open replaces the previous
    /// variant with the next one; any other tap finalizes the open cycle and
    /// starts over at the first variant. Returns false if `variants` is empty.
    pub fn handle_tap(
        &mut self,
        key: Key,
        variants: &[String],
        now: Instant,
        sink: &mut dyn CommitSink,
        scheduler: &mut dyn Scheduler,
    ) -> bool {
        if variants.is_empty() {
            return false;
        }

        let tap_index = match self.cycle.take() {
            Some(cycle) if cycle.key == key => {
                if let Some(token) = cycle.window_timer {
                    scheduler.cancel(token);
                }
                sink.delete_before(cycle.committed.chars().count());
                (cycle.tap_index + 1) % variants.len()
            }
            Some(cycle) => {
                if let Some(token) = cycle.window_timer {
                    scheduler.cancel(token);
                }
                log::trace!("multi-tap {} finalized by {}", cycle.key, key);
                0
            }
            None => 0,
        };

        let text = &variants[tap_index];
        sink.commit_text(text);
        let token = scheduler.schedule(TimerKind::MultiTapWindow(key), now, self.window);
        log::debug!("multi-tap {} #{} -> {:?}", key, tap_index, text);

        self.cycle = Some(MultiTapCycle {
            key,
            tap_index,
            committed: text.clone(),
            window_timer: Some(token),
        });
        true
    }

    /// Window timer fired: accept whatever is on screen.
    pub fn on_window_expired(&mut self, key: Key, token: TimerToken) -> bool {
        match &self.cycle {
            Some(cycle) if cycle.key == key && cycle.window_timer == Some(token) => {
                log::trace!("multi-tap {} accepted: {:?}", key, cycle.committed);
                self.cycle = None;
                true
            }
            _ => false,
        }
    }

    /// Close the open cycle, leaving its text as is
    pub fn finalize(&mut self, scheduler: &mut dyn Scheduler) -> Option<MultiTapCycle> {
        let cycle = self.cycle.take()?;
        if let Some(token) = cycle.window_timer {
            scheduler.cancel(token);
        }
        Some(cycle)
    }

    /// Forget the open cycle without touching timers
    pub fn clear(&mut self) {
        self.cycle = None;
    }
}

/// Variant lists of the keys that cycle on repeated taps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiTapTable {
    variants: HashMap<Key, Vec<String>>,
}

impl MultiTapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Key, variants: Vec<String>) {
        if variants.is_empty() {
            self.variants.remove(&key);
        } else {
            self.variants.insert(key, variants);
        }
    }

    /// Derive the variants of `key` from a layout: lowercase, uppercase,
    /// Alt-lower, Alt-upper, without duplicates. Returns false if the
    /// layout knows nothing about the key.
    pub fn insert_from_layout(&mut self, key: Key, layout: &dyn LayoutLookup) -> bool {
        let variants = derive_variants(key, layout);
        let found = !variants.is_empty();
        self.insert(key, variants);
        found
    }

    pub fn get(&self, key: Key) -> Option<&[String]> {
        self.variants.get(&key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.variants.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

fn derive_variants(key: Key, layout: &dyn LayoutLookup) -> Vec<String> {
    let candidates = [
        layout.character(key, false),
        layout.character(key, true),
        layout.alt_character(key, false),
        layout.alt_character(key, true),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for c in candidates.into_iter().flatten() {
        let text = c.to_string();
        if !variants.contains(&text) {
            variants.push(text);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::KeyLayout;
    use crate::output::TextBuffer;
    use crate::timer::TimerQueue;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn variants(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cycle_and_wrap() {
        let t0 = Instant::now();
        let abc = variants(&["a", "b", "c"]);
        let mut resolver = MultiTapResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        for (i, expected) in ["a", "b", "c", "a"].iter().enumerate() {
            let at = t0 + ms(100 * i as u64);
            assert!(resolver.handle_tap(Key::K, &abc, at, &mut buffer, &mut queue));
            assert_eq!(buffer.text(), *expected);
        }
        assert_eq!(resolver.current().unwrap().tap_index, 0);
        // only the latest window timer is outstanding
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_other_key_finalizes() {
        let t0 = Instant::now();
        let mut resolver = MultiTapResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.handle_tap(Key::K, &variants(&["a", "b"]), t0, &mut buffer, &mut queue);
        resolver.handle_tap(Key::K, &variants(&["a", "b"]), t0 + ms(50), &mut buffer, &mut queue);
        resolver.handle_tap(Key::L, &variants(&["x", "y"]), t0 + ms(100), &mut buffer, &mut queue);
        assert_eq!(buffer.text(), "bx");
        assert_eq!(resolver.active_key(), Some(Key::L));
    }

    #[test]
    fn test_window_expiry_accepts() {
        let t0 = Instant::now();
        let list = variants(&["a", "b"]);
        let mut resolver = MultiTapResolver::new(ms(300));
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.handle_tap(Key::K, &list, t0, &mut buffer, &mut queue);
        let due = queue.pop_due(t0 + ms(300)).unwrap();
        assert!(resolver.on_window_expired(Key::K, due.token));
        assert!(resolver.current().is_none());

        // next tap starts over and appends
        resolver.handle_tap(Key::K, &list, t0 + ms(400), &mut buffer, &mut queue);
        assert_eq!(buffer.text(), "aa");
    }

    #[test]
    fn test_stale_window_timer() {
        let t0 = Instant::now();
        let list = variants(&["a", "b"]);
        let mut resolver = MultiTapResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.handle_tap(Key::K, &list, t0, &mut buffer, &mut queue);
        let first = resolver.current().unwrap().window_timer.unwrap();
        resolver.handle_tap(Key::K, &list, t0 + ms(100), &mut buffer, &mut queue);
        assert!(!resolver.on_window_expired(Key::K, first));
        assert_eq!(resolver.active_key(), Some(Key::K));
    }

    #[test]
    fn test_empty_variants() {
        let mut resolver = MultiTapResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();
        assert!(!resolver.handle_tap(Key::K, &[], Instant::now(), &mut buffer, &mut queue));
        assert!(buffer.text().is_empty());
    }

    #[test]
    fn test_variants_from_layout() {
        let layout = KeyLayout::qwerty();
        let mut table = MultiTapTable::new();
        assert!(table.insert_from_layout(Key::Q, &layout));
        // '0' has no uppercase, so it appears once
        assert_eq!(table.get(Key::Q).unwrap(), variants(&["q", "Q", "0"]).as_slice());
        assert!(!table.insert_from_layout(Key::ENTER, &layout));
        assert!(!table.contains(Key::ENTER));
    }
}
