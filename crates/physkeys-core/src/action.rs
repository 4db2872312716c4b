use std::fmt;

/// Edge of a physical key event. Hosts report auto-repeat while a key is
/// held; a repeat counts as another key-down for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Release,
    Press,
    Repeat,
}

impl KeyAction {
    /// Returns true for key-down edges, including OS auto-repeat
    pub fn is_down(self) -> bool {
        matches!(self, KeyAction::Press | KeyAction::Repeat)
    }

    /// Returns true only for the initial press
    pub fn just_pressed(self) -> bool {
        matches!(self, KeyAction::Press)
    }

    pub fn is_repeat(self) -> bool {
        matches!(self, KeyAction::Repeat)
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Release => write!(f, "release"),
            KeyAction::Press => write!(f, "press"),
            KeyAction::Repeat => write!(f, "repeat"),
        }
    }
}
