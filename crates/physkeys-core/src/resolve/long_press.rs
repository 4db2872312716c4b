// Physkeys Long Press
// Commit the plain character at once, swap in the alternate if the key is held

use std::time::{Duration, Instant};

use crate::output::CommitSink;
use crate::state::{PendingKeyPress, PendingPresses};
use crate::timer::{Scheduler, TimerKind, TimerToken};
use crate::Key;

/// Default hold time before a press becomes a long press
pub const DEFAULT_LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct LongPressResolver {
    threshold: Duration,
    pending: PendingPresses,
}

impl Default for LongPressResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS_THRESHOLD)
    }
}

impl LongPressResolver {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pending: PendingPresses::new(),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: Duration) {
        self.threshold = threshold;
    }

    pub fn is_pending(&self, key: Key) -> bool {
        self.pending.contains(key)
    }

    pub fn pending(&self) -> &PendingPresses {
        &self.pending
    }

    /// Key-down for a key that has an alternate variant.
    ///
    /// Commits `plain` and arms the long-press timer. A key-down for a key
    /// that already has a pending press is ignored and reported as handled,
    /// which is how OS auto-repeat is absorbed.
    pub fn on_key_down(
        &mut self,
        key: Key,
        plain: &str,
        alternate: &str,
        now: Instant,
        sink: &mut dyn CommitSink,
        scheduler: &mut dyn Scheduler,
    ) -> bool {
        if self.pending.contains(key) {
            log::trace!("{} already pending, repeat ignored", key);
            return true;
        }
        sink.commit_text(plain);
        self.arm(key, plain, alternate, now, scheduler);
        true
    }

    /// Arm (or re-arm) the long-press timer for text that is already on
    /// screen, without committing anything.
    pub fn arm(
        &mut self,
        key: Key,
        committed: &str,
        alternate: &str,
        now: Instant,
        scheduler: &mut dyn Scheduler,
    ) {
        let press_start = match self.pending.remove(key) {
            Some(old) => {
                if let Some(token) = old.timer {
                    scheduler.cancel(token);
                }
                old.press_start
            }
            None => now,
        };

        let token = scheduler.schedule(TimerKind::LongPress(key), now, self.threshold);
        let mut press = PendingKeyPress::new(key, press_start, committed);
        press.alternate = Some(alternate.to_string());
        press.timer = Some(token);
        self.pending.insert(press);
    }

    /// Long-press timer fired. Returns the inserted alternate, or None if
    /// the press was released or cancelled in the meantime.
    pub fn on_timer(&mut self, key: Key, token: TimerToken, sink: &mut dyn CommitSink) -> Option<String> {
        let press = self.pending.get_mut(key)?;
        if !press.owns_timer(token) {
            log::trace!("stale long-press timer {:?} for {}", token, key);
            return None;
        }
        let alternate = press.alternate.clone()?;

        sink.delete_before(press.committed.chars().count());
        sink.commit_text(&alternate);
        log::debug!("long press {}: {:?} -> {:?}", key, press.committed, alternate);

        press.committed = alternate.clone();
        press.timer = None;
        press.long_press_activated = true;
        Some(alternate)
    }

    /// Key-up. Returns whether the press had turned into a long press, or
    /// None if nothing was pending for the key.
    pub fn on_key_up(&mut self, key: Key, scheduler: &mut dyn Scheduler) -> Option<bool> {
        let press = self.pending.remove(key)?;
        if let Some(token) = press.timer {
            scheduler.cancel(token);
        }
        Some(press.long_press_activated)
    }

    /// Drop the pending press of one key
    pub fn cancel(&mut self, key: Key, scheduler: &mut dyn Scheduler) -> bool {
        self.on_key_up(key, scheduler).is_some()
    }

    /// Another key went down: presses of other keys keep what they committed.
    /// Their records stay until key-up so their auto-repeat is still absorbed.
    pub fn settle_others(&mut self, key: Key, scheduler: &mut dyn Scheduler) -> usize {
        let others: Vec<Key> = self.pending.keys().filter(|k| *k != key).collect();
        let mut settled = 0;
        for other in others {
            let Some(press) = self.pending.get_mut(other) else {
                continue;
            };
            if let Some(token) = press.timer.take() {
                scheduler.cancel(token);
                log::trace!("{} settled as {:?} by {}", other, press.committed, key);
                settled += 1;
            }
        }
        settled
    }

    /// Drop every pending press and its timer
    pub fn cancel_all(&mut self, scheduler: &mut dyn Scheduler) {
        for press in self.pending.drain() {
            if let Some(token) = press.timer {
                scheduler.cancel(token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TextBuffer;
    use crate::timer::TimerQueue;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_long_press_replaces_plain() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        assert!(resolver.on_key_down(Key::Q, "q", "0", t0, &mut buffer, &mut queue));
        assert_eq!(buffer.text(), "q");

        let due = queue.pop_due(t0 + ms(500)).unwrap();
        assert_eq!(due.kind, TimerKind::LongPress(Key::Q));
        assert_eq!(resolver.on_timer(Key::Q, due.token, &mut buffer), Some("0".to_string()));
        assert_eq!(buffer.text(), "0");

        assert_eq!(resolver.on_key_up(Key::Q, &mut queue), Some(true));
        assert_eq!(buffer.text(), "0");
    }

    #[test]
    fn test_short_press_keeps_plain() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.on_key_down(Key::Q, "q", "0", t0, &mut buffer, &mut queue);
        assert_eq!(resolver.on_key_up(Key::Q, &mut queue), Some(false));
        assert!(queue.is_empty());
        assert_eq!(buffer.text(), "q");
    }

    #[test]
    fn test_stale_timer_is_noop() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.on_key_down(Key::Q, "q", "0", t0, &mut buffer, &mut queue);
        let token = resolver.pending().get(Key::Q).unwrap().timer.unwrap();
        resolver.on_key_up(Key::Q, &mut queue);

        // a host that could not cancel still delivers the callback
        assert_eq!(resolver.on_timer(Key::Q, token, &mut buffer), None);
        assert_eq!(buffer.text(), "q");
    }

    #[test]
    fn test_repeat_is_ignored() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.on_key_down(Key::W, "w", "1", t0, &mut buffer, &mut queue);
        assert!(resolver.on_key_down(Key::W, "w", "1", t0 + ms(30), &mut buffer, &mut queue));
        assert_eq!(buffer.text(), "w");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_timer_fires_only_once() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::new(ms(300));
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.on_key_down(Key::E, "e", "2", t0, &mut buffer, &mut queue);
        let due = queue.pop_due(t0 + ms(300)).unwrap();
        resolver.on_timer(Key::E, due.token, &mut buffer);
        assert_eq!(resolver.on_timer(Key::E, due.token, &mut buffer), None);
        assert_eq!(buffer.text(), "2");
    }

    #[test]
    fn test_rearm_keeps_press_start() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();

        resolver.arm(Key::A, "a", "*", t0, &mut queue);
        resolver.arm(Key::A, "A", "*", t0 + ms(100), &mut queue);
        let press = resolver.pending().get(Key::A).unwrap();
        assert_eq!(press.press_start, t0);
        assert_eq!(press.committed, "A");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(t0 + ms(600)));
    }

    #[test]
    fn test_other_key_settles_pending_press() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.on_key_down(Key::Q, "q", "0", t0, &mut buffer, &mut queue);
        let token = resolver.pending().get(Key::Q).unwrap().timer.unwrap();
        resolver.on_key_down(Key::W, "w", "1", t0 + ms(100), &mut buffer, &mut queue);

        assert_eq!(resolver.settle_others(Key::W, &mut queue), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(resolver.on_timer(Key::Q, token, &mut buffer), None);
        assert_eq!(buffer.text(), "qw");

        // the settled press still absorbs its auto-repeat until key-up
        assert!(resolver.is_pending(Key::Q));
        assert_eq!(resolver.on_key_up(Key::Q, &mut queue), Some(false));
    }

    #[test]
    fn test_cancel_all() {
        let t0 = Instant::now();
        let mut resolver = LongPressResolver::default();
        let mut queue = TimerQueue::new();
        let mut buffer = TextBuffer::new();

        resolver.on_key_down(Key::A, "a", "*", t0, &mut buffer, &mut queue);
        resolver.on_key_down(Key::S, "s", "4", t0, &mut buffer, &mut queue);
        resolver.cancel_all(&mut queue);
        assert!(queue.is_empty());
        assert!(!resolver.is_pending(Key::A));
        assert_eq!(resolver.on_key_up(Key::S, &mut queue), None);
    }
}
