// Physkeys Key Type
// Physical key codes, canonical names and name aliases
//
// The named constants and lookup tables are generated from keycodes.txt.

use std::fmt;
use std::str::FromStr;

include!(concat!(env!("OUT_DIR"), "/key_codes.rs"));

/// Resolve a key from its canonical name or an alias (case-insensitive).
///
/// A bare digit ("1") resolves to the number-row key.
pub fn key_from_name(name: &str) -> Option<Key> {
    let upper = name.trim().to_ascii_uppercase();
    let lookup = if upper.len() == 1 && upper.as_bytes()[0].is_ascii_digit() {
        format!("KEY_{}", upper)
    } else {
        upper
    };

    KEY_TABLE
        .iter()
        .chain(KEY_ALIASES.iter())
        .find(|(n, _)| *n == lookup)
        .map(|(_, code)| Key(*code))
}

impl Key {
    /// Raw numeric code
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Canonical name of this key ("UNKNOWN" when unnamed)
    pub fn name(self) -> &'static str {
        key_name(self.0)
    }

    /// Lowercase letter printed on this key, if it is a letter key
    pub fn letter(self) -> Option<char> {
        let name = self.name();
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
            _ => None,
        }
    }

    /// Whether this is one of the 26 letter keys
    pub fn is_alphabetic(self) -> bool {
        self.letter().is_some()
    }
}
