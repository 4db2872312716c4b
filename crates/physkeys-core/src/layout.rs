// Physkeys Layout
// Character lookup for physical keys, with Shift and Alt variants

use std::collections::HashMap;

use crate::Key;

/// Character lookup the router consults for every printable key
pub trait LayoutLookup {
    /// Character for `key`, uppercase/shifted variant when `shift` is set
    fn character(&self, key: Key, shift: bool) -> Option<char>;

    /// Alt-layer character for `key`
    fn alt_character(&self, key: Key, shift: bool) -> Option<char>;
}

/// Characters printed on one key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyChars {
    pub plain: Option<char>,
    pub shift: Option<char>,
    pub alt: Option<char>,
    pub alt_shift: Option<char>,
}

impl KeyChars {
    pub fn new(plain: char) -> Self {
        Self {
            plain: Some(plain),
            ..Self::default()
        }
    }

    pub fn with_alt(mut self, alt: char) -> Self {
        self.alt = Some(alt);
        self
    }

    /// Shifted character, falling back to the uppercase of the plain one
    pub fn shifted(&self) -> Option<char> {
        self.shift.or_else(|| self.plain.map(upper))
    }

    /// Shifted Alt character, falling back to the uppercase of the Alt one
    pub fn alt_shifted(&self) -> Option<char> {
        self.alt_shift.or_else(|| self.alt.map(upper))
    }
}

fn upper(c: char) -> char {
    let mut it = c.to_uppercase();
    match (it.next(), it.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Table-driven layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyLayout {
    keys: HashMap<Key, KeyChars>,
}

/// Alt characters of a typical QWERTY phone keyboard, by row
const QWERTY_ALT: &[(Key, char)] = &[
    (Key::Q, '0'),
    (Key::W, '1'),
    (Key::E, '2'),
    (Key::R, '3'),
    (Key::T, '('),
    (Key::Y, ')'),
    (Key::U, '_'),
    (Key::I, '-'),
    (Key::O, '+'),
    (Key::P, '@'),
    (Key::A, '*'),
    (Key::S, '4'),
    (Key::D, '5'),
    (Key::F, '6'),
    (Key::G, '/'),
    (Key::H, ':'),
    (Key::J, ';'),
    (Key::K, '\''),
    (Key::L, '"'),
    (Key::Z, '7'),
    (Key::X, '8'),
    (Key::C, '9'),
    (Key::V, '?'),
    (Key::B, '!'),
    (Key::N, ','),
    (Key::M, '.'),
];

impl KeyLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in QWERTY layout: letters, Space and the number row on Alt
    pub fn qwerty() -> Self {
        let mut layout = Self::new();
        for code in 0..=255u16 {
            let key = Key::from(code);
            if let Some(letter) = key.letter() {
                layout.insert(key, KeyChars::new(letter));
            }
        }
        for &(key, alt) in QWERTY_ALT {
            if let Some(chars) = layout.keys.get_mut(&key) {
                chars.alt = Some(alt);
            }
        }
        layout.insert(Key::SPACE, KeyChars::new(' '));
        layout.insert(Key::DOT, KeyChars::new('.').with_alt(','));
        layout
    }

    pub fn insert(&mut self, key: Key, chars: KeyChars) {
        self.keys.insert(key, chars);
    }

    pub fn get(&self, key: Key) -> Option<&KeyChars> {
        self.keys.get(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl LayoutLookup for KeyLayout {
    fn character(&self, key: Key, shift: bool) -> Option<char> {
        let chars = self.keys.get(&key)?;
        if shift {
            chars.shifted()
        } else {
            chars.plain
        }
    }

    fn alt_character(&self, key: Key, shift: bool) -> Option<char> {
        let chars = self.keys.get(&key)?;
        if shift {
            chars.alt_shifted()
        } else {
            chars.alt
        }
    }
}
