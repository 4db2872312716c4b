// Physkeys Ctrl Commands
// Ctrl-command table and the dispatcher that runs it

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::output::CommitSink;
use crate::Key;

/// How far back Ctrl+Backspace looks for the previous word
const WORD_SCAN_LIMIT: usize = 64;

/// Editor actions reachable through the Ctrl table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum EditorAction {
    Copy,
    Cut,
    Paste,
    Undo,
    SelectAll,
    ExpandSelectionLeft,
    ExpandSelectionRight,
}

impl fmt::Display for EditorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Keys a Ctrl mapping may remap to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum KeyKind {
    #[strum(to_string = "DpadUp", serialize = "DPAD_UP", serialize = "KEYCODE_DPAD_UP")]
    DpadUp,
    #[strum(to_string = "DpadDown", serialize = "DPAD_DOWN", serialize = "KEYCODE_DPAD_DOWN")]
    DpadDown,
    #[strum(to_string = "DpadLeft", serialize = "DPAD_LEFT", serialize = "KEYCODE_DPAD_LEFT")]
    DpadLeft,
    #[strum(to_string = "DpadRight", serialize = "DPAD_RIGHT", serialize = "KEYCODE_DPAD_RIGHT")]
    DpadRight,
    #[strum(to_string = "Tab", serialize = "KEYCODE_TAB")]
    Tab,
    #[strum(to_string = "PageUp", serialize = "PAGE_UP", serialize = "KEYCODE_PAGE_UP")]
    PageUp,
    #[strum(to_string = "PageDown", serialize = "PAGE_DOWN", serialize = "KEYCODE_PAGE_DOWN")]
    PageDown,
    #[strum(to_string = "Escape", serialize = "KEYCODE_ESCAPE")]
    Escape,
}

impl KeyKind {
    /// Physical key synthesized for this kind
    pub fn key(self) -> Key {
        match self {
            KeyKind::DpadUp => Key::UP,
            KeyKind::DpadDown => Key::DOWN,
            KeyKind::DpadLeft => Key::LEFT,
            KeyKind::DpadRight => Key::RIGHT,
            KeyKind::Tab => Key::TAB,
            KeyKind::PageUp => Key::PAGE_UP,
            KeyKind::PageDown => Key::PAGE_DOWN,
            KeyKind::Escape => Key::ESC,
        }
    }
}

/// Errors raised while validating a Ctrl table entry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CtrlMappingError {
    #[error("Unknown mapping type: {0} (expected \"action\" or \"keycode\")")]
    UnknownType(String),

    #[error("Unknown editor action: {0}")]
    UnknownAction(String),

    #[error("Unknown keycode: {0}")]
    UnknownKeycode(String),
}

/// One validated entry of the Ctrl table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtrlMapping {
    Action(EditorAction),
    Keycode(KeyKind),
}

impl CtrlMapping {
    /// Validate a `{ type, value }` pair
    pub fn parse(kind: &str, value: &str) -> Result<Self, CtrlMappingError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "action" => EditorAction::from_str(value.trim())
                .map(CtrlMapping::Action)
                .map_err(|_| CtrlMappingError::UnknownAction(value.to_string())),
            "keycode" => KeyKind::from_str(value.trim())
                .map(CtrlMapping::Keycode)
                .map_err(|_| CtrlMappingError::UnknownKeycode(value.to_string())),
            _ => Err(CtrlMappingError::UnknownType(kind.to_string())),
        }
    }
}

impl fmt::Display for CtrlMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtrlMapping::Action(action) => write!(f, "action:{}", action),
            CtrlMapping::Keycode(kind) => write!(f, "keycode:{}", kind.as_ref()),
        }
    }
}

/// Ctrl-command table, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CtrlTable {
    entries: IndexMap<Key, CtrlMapping>,
}

impl CtrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used when a config has no `[ctrl]` section
    pub fn standard() -> Self {
        use CtrlMapping::{Action, Keycode};

        let mut table = Self::new();
        table.insert(Key::C, Action(EditorAction::Copy));
        table.insert(Key::X, Action(EditorAction::Cut));
        table.insert(Key::V, Action(EditorAction::Paste));
        table.insert(Key::Z, Action(EditorAction::Undo));
        table.insert(Key::A, Action(EditorAction::SelectAll));
        table.insert(Key::W, Action(EditorAction::ExpandSelectionLeft));
        table.insert(Key::R, Action(EditorAction::ExpandSelectionRight));
        table.insert(Key::E, Keycode(KeyKind::DpadUp));
        table.insert(Key::S, Keycode(KeyKind::DpadLeft));
        table.insert(Key::D, Keycode(KeyKind::DpadDown));
        table.insert(Key::F, Keycode(KeyKind::DpadRight));
        table.insert(Key::T, Keycode(KeyKind::Tab));
        table.insert(Key::P, Keycode(KeyKind::PageUp));
        table.insert(Key::N, Keycode(KeyKind::PageDown));
        table.insert(Key::Q, Keycode(KeyKind::Escape));
        table
    }

    /// Add an entry; returns the mapping it replaced
    pub fn insert(&mut self, key: Key, mapping: CtrlMapping) -> Option<CtrlMapping> {
        self.entries.insert(key, mapping)
    }

    pub fn lookup(&self, key: Key) -> Option<CtrlMapping> {
        self.entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &CtrlMapping)> {
        self.entries.iter()
    }
}

/// Runs Ctrl combinations against the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrlCommandDispatcher;

impl CtrlCommandDispatcher {
    /// Dispatch `key` while Ctrl is logically active.
    ///
    /// Returns false only for keys that must keep their normal meaning
    /// (Enter and Back). Unmapped keys are swallowed.
    pub fn dispatch(key: Key, table: &CtrlTable, sink: &mut dyn CommitSink) -> bool {
        if key == Key::ENTER || key == Key::BACK {
            return false;
        }

        if key == Key::BACKSPACE {
            delete_selection_or_word(sink);
            return true;
        }

        match table.lookup(key) {
            Some(CtrlMapping::Action(action)) => {
                if !sink.perform_editor_action(action) {
                    log::debug!("Ctrl+{}: editor could not {}", key, action);
                }
            }
            Some(CtrlMapping::Keycode(kind)) => {
                sink.synthesize_key(kind.key());
            }
            None => {
                log::debug!("Ctrl+{} unmapped, swallowed", key);
            }
        }
        true
    }
}

fn delete_selection_or_word(sink: &mut dyn CommitSink) {
    if sink.delete_selection() {
        return;
    }
    let before = sink.text_before_cursor(WORD_SCAN_LIMIT);
    let count = previous_word_len(&before);
    if count > 0 {
        sink.delete_before(count);
    }
}

/// Characters to delete so the word before the cursor (plus trailing
/// whitespace) disappears. A lone punctuation mark counts as a word.
pub(crate) fn previous_word_len(text: &str) -> usize {
    let mut chars = text.chars().rev().peekable();
    let mut count = 0;

    while chars.next_if(|c| c.is_whitespace()).is_some() {
        count += 1;
    }

    match chars.peek() {
        Some(c) if c.is_alphanumeric() => {
            while chars.next_if(|c| c.is_alphanumeric()).is_some() {
                count += 1;
            }
        }
        Some(_) => count += 1,
        None => {}
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TextBuffer;

    #[derive(Default)]
    struct RecordingSink {
        committed: Vec<String>,
        deleted: Vec<usize>,
        keys: Vec<Key>,
        actions: Vec<EditorAction>,
        selection: usize,
        before: String,
    }

    impl CommitSink for RecordingSink {
        fn commit_text(&mut self, text: &str) {
            self.committed.push(text.to_string());
        }
        fn delete_before(&mut self, count: usize) {
            self.deleted.push(count);
        }
        fn synthesize_key(&mut self, key: Key) {
            self.keys.push(key);
        }
        fn perform_editor_action(&mut self, action: EditorAction) -> bool {
            self.actions.push(action);
            false
        }
        fn selected_text_len(&self) -> usize {
            self.selection
        }
        fn text_before_cursor(&self, _max: usize) -> String {
            self.before.clone()
        }
    }

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            CtrlMapping::parse("action", "selectAll"),
            Ok(CtrlMapping::Action(EditorAction::SelectAll))
        );
        assert_eq!(
            CtrlMapping::parse("keycode", "KEYCODE_DPAD_UP"),
            Ok(CtrlMapping::Keycode(KeyKind::DpadUp))
        );
        assert_eq!(
            CtrlMapping::parse("Keycode", "pagedown"),
            Ok(CtrlMapping::Keycode(KeyKind::PageDown))
        );
        assert!(matches!(
            CtrlMapping::parse("action", "explode"),
            Err(CtrlMappingError::UnknownAction(_))
        ));
        assert!(matches!(
            CtrlMapping::parse("macro", "copy"),
            Err(CtrlMappingError::UnknownType(_))
        ));
    }

    #[test]
    fn test_action_names() {
        assert_eq!(EditorAction::ExpandSelectionLeft.to_string(), "expandSelectionLeft");
        assert_eq!(EditorAction::from_str("undo"), Ok(EditorAction::Undo));
    }

    #[test]
    fn test_action_always_handled() {
        let table = CtrlTable::standard();
        let mut sink = RecordingSink::default();
        // The sink reports failure, yet the key is still claimed
        assert!(CtrlCommandDispatcher::dispatch(Key::C, &table, &mut sink));
        assert_eq!(sink.actions, vec![EditorAction::Copy]);
        assert!(sink.committed.is_empty());
    }

    #[test]
    fn test_keycode_remap() {
        let table = CtrlTable::standard();
        let mut sink = RecordingSink::default();
        assert!(CtrlCommandDispatcher::dispatch(Key::E, &table, &mut sink));
        assert!(CtrlCommandDispatcher::dispatch(Key::T, &table, &mut sink));
        assert_eq!(sink.keys, vec![Key::UP, Key::TAB]);
    }

    #[test]
    fn test_unmapped_is_swallowed() {
        let table = CtrlTable::new();
        let mut sink = RecordingSink::default();
        assert!(CtrlCommandDispatcher::dispatch(Key::K, &table, &mut sink));
        assert!(sink.committed.is_empty());
        assert!(sink.keys.is_empty());
    }

    #[test]
    fn test_enter_and_back_pass_through() {
        let mut table = CtrlTable::new();
        table.insert(Key::ENTER, CtrlMapping::Keycode(KeyKind::Tab));
        let mut sink = RecordingSink::default();
        assert!(!CtrlCommandDispatcher::dispatch(Key::ENTER, &table, &mut sink));
        assert!(!CtrlCommandDispatcher::dispatch(Key::BACK, &table, &mut sink));
        assert!(sink.keys.is_empty());
    }

    #[test]
    fn test_backspace_deletes_selection() {
        let table = CtrlTable::standard();
        let mut sink = RecordingSink {
            selection: 4,
            before: "hello".into(),
            ..Default::default()
        };
        assert!(CtrlCommandDispatcher::dispatch(Key::BACKSPACE, &table, &mut sink));
        assert_eq!(sink.committed, vec![String::new()]);
        assert!(sink.deleted.is_empty());
    }

    #[test]
    fn test_backspace_uses_sink_selection_delete() {
        let table = CtrlTable::standard();
        let mut buffer = TextBuffer::with_text("hello world");
        buffer.select(6, 11);
        assert!(CtrlCommandDispatcher::dispatch(Key::BACKSPACE, &table, &mut buffer));
        assert_eq!(buffer.text(), "hello ");
        assert_eq!(buffer.selection(), None);
    }

    #[test]
    fn test_backspace_deletes_previous_word() {
        let table = CtrlTable::standard();
        let mut sink = RecordingSink {
            before: "hello brave  ".into(),
            ..Default::default()
        };
        assert!(CtrlCommandDispatcher::dispatch(Key::BACKSPACE, &table, &mut sink));
        assert_eq!(sink.deleted, vec![7]);
    }

    #[test]
    fn test_previous_word_len() {
        assert_eq!(previous_word_len(""), 0);
        assert_eq!(previous_word_len("abc"), 3);
        assert_eq!(previous_word_len("one two"), 3);
        assert_eq!(previous_word_len("end."), 1);
        assert_eq!(previous_word_len("   "), 3);
    }

    #[test]
    fn test_table_keeps_insertion_order() {
        let table = CtrlTable::standard();
        let first: Vec<Key> = table.iter().take(3).map(|(k, _)| *k).collect();
        assert_eq!(first, vec![Key::C, Key::X, Key::V]);
    }
}
