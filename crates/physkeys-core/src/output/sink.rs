// Physkeys Commit Sink
// The editor-side collaborator that receives committed text and synthetic keys

use crate::ctrl::EditorAction;
use crate::Key;

/// Receives everything the core produces.
///
/// Only the first four methods are required; the rest describe editor
/// capabilities some hosts lack and default to "nothing there".
pub trait CommitSink {
    /// Insert text at the cursor, replacing any selection
    fn commit_text(&mut self, text: &str);

    /// Delete `count` characters before the cursor
    fn delete_before(&mut self, count: usize);

    /// Send a synthetic down+up pair for `key`
    fn synthesize_key(&mut self, key: Key);

    /// Run an editor action. Returns false if the editor could not do it.
    fn perform_editor_action(&mut self, action: EditorAction) -> bool;

    /// Length of the current selection in characters
    fn selected_text_len(&self) -> usize {
        0
    }

    /// Remove the selected text. Returns false when nothing is selected.
    ///
    /// The default relies on `commit_text` replacing the selection.
    fn delete_selection(&mut self) -> bool {
        if self.selected_text_len() == 0 {
            return false;
        }
        self.commit_text("");
        true
    }

    /// Up to `max` characters immediately before the cursor
    fn text_before_cursor(&self, _max: usize) -> String {
        String::new()
    }

    /// Offer a key to the launcher's app-shortcut lookup
    fn launch_shortcut(&mut self, _key: Key) -> bool {
        false
    }
}
