// Physkeys SYM Pages
// Off -> Page1 -> Page2 -> Off symbol/emoji layers over the key grid

use std::collections::HashMap;

use crate::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymPage {
    #[default]
    Off,
    Page1,
    Page2,
}

impl SymPage {
    /// Page after one more SYM press
    pub fn next(self) -> SymPage {
        match self {
            SymPage::Off => SymPage::Page1,
            SymPage::Page1 => SymPage::Page2,
            SymPage::Page2 => SymPage::Off,
        }
    }

    pub fn is_open(self) -> bool {
        self != SymPage::Off
    }
}

/// Glyph maps of the two pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymLayers {
    page1: HashMap<Key, String>,
    page2: HashMap<Key, String>,
}

impl SymLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols on page 1, emoji on page 2
    pub fn standard() -> Self {
        let mut layers = Self::new();
        let page1 = [
            (Key::Q, "~"), (Key::W, "`"), (Key::E, "|"), (Key::R, "•"), (Key::T, "√"),
            (Key::Y, "π"), (Key::U, "÷"), (Key::I, "×"), (Key::O, "¶"), (Key::P, "∆"),
            (Key::A, "£"), (Key::S, "€"), (Key::D, "$"), (Key::F, "¢"), (Key::G, "^"),
            (Key::H, "°"), (Key::J, "="), (Key::K, "{"), (Key::L, "}"),
            (Key::Z, "\\"), (Key::X, "©"), (Key::C, "®"), (Key::V, "™"), (Key::B, "%"),
            (Key::N, "["), (Key::M, "]"),
        ];
        let page2 = [
            (Key::Q, "😀"), (Key::W, "😂"), (Key::E, "😍"), (Key::R, "😎"), (Key::T, "🤔"),
            (Key::Y, "😢"), (Key::U, "😡"), (Key::I, "👍"), (Key::O, "👎"), (Key::P, "🙏"),
            (Key::A, "❤️"), (Key::S, "🔥"), (Key::D, "🎉"), (Key::F, "✨"), (Key::G, "💯"),
            (Key::H, "👀"), (Key::J, "🙌"), (Key::K, "👋"), (Key::L, "💪"),
        ];
        for (key, glyph) in page1 {
            layers.insert(SymPage::Page1, key, glyph);
        }
        for (key, glyph) in page2 {
            layers.insert(SymPage::Page2, key, glyph);
        }
        layers
    }

    /// Add a glyph to a page. Ignored for `SymPage::Off`.
    pub fn insert(&mut self, page: SymPage, key: Key, glyph: impl Into<String>) {
        if let Some(map) = self.page_mut(page) {
            map.insert(key, glyph.into());
        }
    }

    pub fn lookup(&self, page: SymPage, key: Key) -> Option<&str> {
        let map = match page {
            SymPage::Off => return None,
            SymPage::Page1 => &self.page1,
            SymPage::Page2 => &self.page2,
        };
        map.get(&key).map(String::as_str)
    }

    pub fn page_len(&self, page: SymPage) -> usize {
        match page {
            SymPage::Off => 0,
            SymPage::Page1 => self.page1.len(),
            SymPage::Page2 => self.page2.len(),
        }
    }

    fn page_mut(&mut self, page: SymPage) -> Option<&mut HashMap<Key, String>> {
        match page {
            SymPage::Off => None,
            SymPage::Page1 => Some(&mut self.page1),
            SymPage::Page2 => Some(&mut self.page2),
        }
    }
}

/// Current SYM page plus the restore slot used across interruptions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymPager {
    page: SymPage,
    pending_restore: Option<SymPage>,
}

impl SymPager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> SymPage {
        self.page
    }

    pub fn is_open(&self) -> bool {
        self.page.is_open()
    }

    /// SYM key pressed: advance the cycle
    pub fn on_sym_key_down(&mut self) -> SymPage {
        self.page = self.page.next();
        log::debug!("SYM page -> {:?}", self.page);
        self.page
    }

    /// Force the page closed. Returns true if it was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.page = SymPage::Off;
        was_open
    }

    /// Apply the auto-close policy. Closing never happens while a modifier
    /// is held.
    pub fn close_if_auto_close(&mut self, auto_close: bool, modifier_held: bool) -> bool {
        if auto_close && !modifier_held {
            self.close()
        } else {
            false
        }
    }

    /// Remember the open page, then close it
    pub fn close_for_interruption(&mut self) {
        if self.is_open() {
            self.pending_restore = Some(self.page);
        }
        self.page = SymPage::Off;
    }

    pub fn has_pending_restore(&self) -> bool {
        self.pending_restore.is_some()
    }

    /// Reopen the remembered page. The slot is emptied by the first call.
    pub fn restore_last_page(&mut self) -> Option<SymPage> {
        let page = self.pending_restore.take()?;
        self.page = page;
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_presses_cycle_back_to_off() {
        let mut pager = SymPager::new();
        assert_eq!(pager.on_sym_key_down(), SymPage::Page1);
        assert_eq!(pager.on_sym_key_down(), SymPage::Page2);
        assert_eq!(pager.on_sym_key_down(), SymPage::Off);
    }

    #[test]
    fn test_page2_goes_to_off() {
        assert_eq!(SymPage::Page2.next(), SymPage::Off);
        assert_ne!(SymPage::Page2.next(), SymPage::Page1);
    }

    #[test]
    fn test_lookup() {
        let layers = SymLayers::standard();
        assert_eq!(layers.lookup(SymPage::Page1, Key::D), Some("$"));
        assert_eq!(layers.lookup(SymPage::Page2, Key::S), Some("🔥"));
        assert_eq!(layers.lookup(SymPage::Off, Key::D), None);
        assert_eq!(layers.lookup(SymPage::Page2, Key::M), None);
    }

    #[test]
    fn test_auto_close_policy() {
        let mut pager = SymPager::new();
        pager.on_sym_key_down();
        assert!(!pager.close_if_auto_close(false, false));
        assert!(!pager.close_if_auto_close(true, true));
        assert!(pager.is_open());
        assert!(pager.close_if_auto_close(true, false));
        assert_eq!(pager.page(), SymPage::Off);
    }

    #[test]
    fn test_restore_consumed_once() {
        let mut pager = SymPager::new();
        pager.on_sym_key_down();
        pager.on_sym_key_down();
        pager.close_for_interruption();
        assert_eq!(pager.page(), SymPage::Off);

        assert_eq!(pager.restore_last_page(), Some(SymPage::Page2));
        assert_eq!(pager.page(), SymPage::Page2);
        pager.close();
        assert_eq!(pager.restore_last_page(), None);
        assert_eq!(pager.page(), SymPage::Off);
    }

    #[test]
    fn test_interruption_while_closed_keeps_slot_empty() {
        let mut pager = SymPager::new();
        pager.close_for_interruption();
        assert!(!pager.has_pending_restore());
    }
}
