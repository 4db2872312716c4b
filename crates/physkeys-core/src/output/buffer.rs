// Physkeys Text Buffer
// In-memory editor implementing the commit sink, used for replays and tests

use std::collections::HashSet;

use crate::ctrl::EditorAction;
use crate::output::CommitSink;
use crate::Key;

/// Undo history depth
const UNDO_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    chars: Vec<char>,
    cursor: usize,
}

/// A single-line editor with cursor, selection, clipboard and undo
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    chars: Vec<char>,
    cursor: usize,
    /// Selection runs from the anchor to the cursor
    anchor: Option<usize>,
    clipboard: String,
    undo: Vec<Snapshot>,
    synthesized: Vec<Key>,
    shortcuts: HashSet<Key>,
    launched: Vec<Key>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the cursor at the end
    pub fn with_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self {
            chars,
            cursor,
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Selected range as (start, end), if any
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    pub fn selected_text(&self) -> String {
        match self.selection() {
            Some((start, end)) => self.chars[start..end].iter().collect(),
            None => String::new(),
        }
    }

    /// Select `start..end` (character indices), cursor at `end`
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.chars.len();
        self.anchor = Some(start.min(len));
        self.cursor = end.min(len);
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Keys received through `synthesize_key`, oldest first
    pub fn synthesized_keys(&self) -> &[Key] {
        &self.synthesized
    }

    /// Make `key` a launcher shortcut
    pub fn register_shortcut(&mut self, key: Key) {
        self.shortcuts.insert(key);
    }

    /// Shortcuts launched so far
    pub fn launched(&self) -> &[Key] {
        &self.launched
    }

    fn checkpoint(&mut self) {
        if self.undo.len() == UNDO_LIMIT {
            self.undo.remove(0);
        }
        self.undo.push(Snapshot {
            chars: self.chars.clone(),
            cursor: self.cursor,
        });
    }

    fn remove_selection(&mut self) -> bool {
        match self.selection() {
            Some((start, end)) => {
                self.chars.drain(start..end);
                self.cursor = start;
                self.anchor = None;
                true
            }
            None => {
                self.anchor = None;
                false
            }
        }
    }

    fn move_cursor(&mut self, to: usize) {
        self.anchor = None;
        self.cursor = to.min(self.chars.len());
    }

    fn extend_selection(&mut self, left: bool) -> bool {
        let anchor = *self.anchor.get_or_insert(self.cursor);
        let target = if left {
            self.cursor.checked_sub(1)
        } else if self.cursor < self.chars.len() {
            Some(self.cursor + 1)
        } else {
            None
        };
        match target {
            Some(pos) => {
                self.cursor = pos;
                true
            }
            None => {
                if anchor == self.cursor {
                    self.anchor = None;
                }
                false
            }
        }
    }
}

impl CommitSink for TextBuffer {
    fn commit_text(&mut self, text: &str) {
        self.checkpoint();
        self.remove_selection();
        for c in text.chars() {
            self.chars.insert(self.cursor, c);
            self.cursor += 1;
        }
    }

    fn delete_before(&mut self, count: usize) {
        self.checkpoint();
        self.anchor = None;
        let count = count.min(self.cursor);
        self.chars.drain(self.cursor - count..self.cursor);
        self.cursor -= count;
    }

    fn synthesize_key(&mut self, key: Key) {
        self.synthesized.push(key);
        match key {
            Key::LEFT => self.move_cursor(self.cursor.saturating_sub(1)),
            Key::RIGHT => self.move_cursor(self.cursor + 1),
            Key::HOME | Key::UP | Key::PAGE_UP => self.move_cursor(0),
            Key::END | Key::DOWN | Key::PAGE_DOWN => self.move_cursor(self.chars.len()),
            _ => {}
        }
    }

    fn perform_editor_action(&mut self, action: EditorAction) -> bool {
        match action {
            EditorAction::Copy => {
                if self.selection().is_none() {
                    return false;
                }
                self.clipboard = self.selected_text();
                true
            }
            EditorAction::Cut => {
                if self.selection().is_none() {
                    return false;
                }
                self.clipboard = self.selected_text();
                self.checkpoint();
                self.remove_selection()
            }
            EditorAction::Paste => {
                if self.clipboard.is_empty() {
                    return false;
                }
                let text = self.clipboard.clone();
                self.commit_text(&text);
                true
            }
            EditorAction::Undo => match self.undo.pop() {
                Some(snapshot) => {
                    self.chars = snapshot.chars;
                    self.cursor = snapshot.cursor;
                    self.anchor = None;
                    true
                }
                None => false,
            },
            EditorAction::SelectAll => {
                self.anchor = Some(0);
                self.cursor = self.chars.len();
                true
            }
            EditorAction::ExpandSelectionLeft => self.extend_selection(true),
            EditorAction::ExpandSelectionRight => self.extend_selection(false),
        }
    }

    fn selected_text_len(&self) -> usize {
        self.selection().map(|(start, end)| end - start).unwrap_or(0)
    }

    fn delete_selection(&mut self) -> bool {
        if self.selection().is_none() {
            return false;
        }
        self.checkpoint();
        self.remove_selection()
    }

    fn text_before_cursor(&self, max: usize) -> String {
        let start = self.cursor.saturating_sub(max);
        self.chars[start..self.cursor].iter().collect()
    }

    fn launch_shortcut(&mut self, key: Key) -> bool {
        if self.shortcuts.contains(&key) {
            self.launched.push(key);
            true
        } else {
            false
        }
    }
}
