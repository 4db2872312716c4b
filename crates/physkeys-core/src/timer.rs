// Physkeys Timers
// Cancelable single-fire deferred callbacks keyed by key code

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::Key;

/// Handle returned when a timer is scheduled.
///
/// Tokens are never reused within one scheduler, so a stale token can be
/// compared against the live one stored in a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Long-press detection for a held key
    LongPress(Key),
    /// Expiry of the multi-tap window for a key
    MultiTapWindow(Key),
}

impl TimerKind {
    pub fn key(self) -> Key {
        match self {
            TimerKind::LongPress(key) | TimerKind::MultiTapWindow(key) => key,
        }
    }
}

/// Deferred-callback capability used by the resolvers.
///
/// Implementations never invoke anything themselves: the host asks which
/// timers are due and feeds them back into the router. A timer that was
/// cancelled may still be delivered by some hosts, so receivers check
/// liveness themselves.
pub trait Scheduler {
    /// Schedule a timer `delay` after `now`
    fn schedule(&mut self, kind: TimerKind, now: Instant, delay: Duration) -> TimerToken;

    /// Cancel a timer. Returns false if it was not outstanding.
    fn cancel(&mut self, token: TimerToken) -> bool;

    /// Cancel every outstanding timer
    fn cancel_all(&mut self);

    /// Earliest outstanding deadline, if any
    fn next_deadline(&self) -> Option<Instant>;
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub token: TimerToken,
    pub kind: TimerKind,
    pub deadline: Instant,
}

/// Deterministic timer queue driven by an explicit clock.
///
/// Timers are ordered by deadline, then by scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: BTreeMap<(Instant, TimerToken), TimerKind>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Whether a token is still outstanding
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.timers.keys().any(|(_, t)| *t == token)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<DueTimer> {
        let (&(deadline, token), _) = self.timers.iter().next()?;
        if deadline > now {
            return None;
        }
        let kind = self.timers.remove(&(deadline, token))?;
        Some(DueTimer {
            token,
            kind,
            deadline,
        })
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, kind: TimerKind, now: Instant, delay: Duration) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        self.timers.insert((now + delay, token), kind);
        log::trace!("timer {:?} scheduled for {:?} (+{:?})", token, kind, delay);
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        let slot = self.timers.keys().find(|(_, t)| *t == token).copied();
        match slot {
            Some(slot) => {
                self.timers.remove(&slot);
                true
            }
            None => false,
        }
    }

    fn cancel_all(&mut self) {
        self.timers.clear();
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let late = queue.schedule(TimerKind::LongPress(Key::Q), t0, ms(500));
        let early = queue.schedule(TimerKind::MultiTapWindow(Key::W), t0, ms(400));

        assert_eq!(queue.next_deadline(), Some(t0 + ms(400)));
        assert!(queue.pop_due(t0 + ms(399)).is_none());

        let first = queue.pop_due(t0 + ms(600)).unwrap();
        assert_eq!(first.token, early);
        assert_eq!(first.kind.key(), Key::W);
        let second = queue.pop_due(t0 + ms(600)).unwrap();
        assert_eq!(second.token, late);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let token = queue.schedule(TimerKind::LongPress(Key::A), t0, ms(100));
        assert!(queue.is_pending(token));
        assert!(queue.cancel(token));
        assert!(!queue.cancel(token));
        assert!(queue.pop_due(t0 + ms(1000)).is_none());
    }

    #[test]
    fn test_tokens_are_unique() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let a = queue.schedule(TimerKind::LongPress(Key::A), t0, ms(100));
        queue.cancel_all();
        let b = queue.schedule(TimerKind::LongPress(Key::A), t0, ms(100));
        assert_ne!(a, b);
        assert_eq!(queue.len(), 1);
    }
}
