// Physkeys Pending Presses
// Per-key records of presses whose final character is not settled yet

use std::collections::HashMap;
use std::time::Instant;

use crate::timer::TimerToken;
use crate::Key;

/// A key that is down and may still be replaced by its long-press variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingKeyPress {
    pub key: Key,
    pub press_start: Instant,
    /// Text committed for this press so far
    pub committed: String,
    /// Replacement committed if the press turns into a long press
    pub alternate: Option<String>,
    pub timer: Option<TimerToken>,
    pub long_press_activated: bool,
}

impl PendingKeyPress {
    pub fn new(key: Key, press_start: Instant, committed: impl Into<String>) -> Self {
        Self {
            key,
            press_start,
            committed: committed.into(),
            alternate: None,
            timer: None,
            long_press_activated: false,
        }
    }

    /// Whether `token` is the live timer of this press
    pub fn owns_timer(&self, token: TimerToken) -> bool {
        self.timer == Some(token) && !self.long_press_activated
    }
}

/// At most one pending press per key
#[derive(Debug, Default)]
pub struct PendingPresses {
    presses: HashMap<Key, PendingKeyPress>,
}

impl PendingPresses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.presses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presses.is_empty()
    }

    pub fn contains(&self, key: Key) -> bool {
        self.presses.contains_key(&key)
    }

    pub fn get(&self, key: Key) -> Option<&PendingKeyPress> {
        self.presses.get(&key)
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut PendingKeyPress> {
        self.presses.get_mut(&key)
    }

    /// Insert a record, returning the one it replaced
    pub fn insert(&mut self, press: PendingKeyPress) -> Option<PendingKeyPress> {
        self.presses.insert(press.key, press)
    }

    pub fn remove(&mut self, key: Key) -> Option<PendingKeyPress> {
        self.presses.remove(&key)
    }

    /// Remove every record, returning them
    pub fn drain(&mut self) -> impl Iterator<Item = PendingKeyPress> + '_ {
        self.presses.drain().map(|(_, press)| press)
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.presses.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_record_per_key() {
        let t0 = Instant::now();
        let mut pending = PendingPresses::new();
        assert!(pending.insert(PendingKeyPress::new(Key::Q, t0, "q")).is_none());
        let replaced = pending.insert(PendingKeyPress::new(Key::Q, t0, "Q"));
        assert_eq!(replaced.map(|p| p.committed), Some("q".to_string()));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.get(Key::Q).unwrap().committed, "Q");
    }

    #[test]
    fn test_owns_timer() {
        let mut press = PendingKeyPress::new(Key::A, Instant::now(), "a");
        press.timer = Some(TimerToken(3));
        assert!(press.owns_timer(TimerToken(3)));
        assert!(!press.owns_timer(TimerToken(4)));
        press.long_press_activated = true;
        assert!(!press.owns_timer(TimerToken(3)));
    }

    #[test]
    fn test_drain() {
        let t0 = Instant::now();
        let mut pending = PendingPresses::new();
        pending.insert(PendingKeyPress::new(Key::A, t0, "a"));
        pending.insert(PendingKeyPress::new(Key::B, t0, "b"));
        assert_eq!(pending.drain().count(), 2);
        assert!(pending.is_empty());
    }
}
