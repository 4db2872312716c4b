// Physkeys Transform Module
// Priority-ordered key routing from raw events to commits and synthetic keys

pub mod handlers;
pub mod router;

use crate::mode::SymPage;
use crate::modifier::ModifierSnapshot;
use crate::Key;

pub use handlers::{default_handlers, HandlerContext, KeyHandler};
pub use router::{InputEventRouter, RouterConfig};

/// What the host should do with the raw key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterDecision {
    /// Handled here; the host drops the event
    Consume,
    /// Let the host's default handling run
    PassThrough,
    /// Deliver the given key to the focused UI instead
    PassThroughWithKeycode(Key),
}

impl RouterDecision {
    pub fn is_consumed(self) -> bool {
        self == RouterDecision::Consume
    }
}

/// State changes a status display or hint overlay may care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A long press swapped in an alternate character
    AltCharacterInserted { key: Key, text: String },
    SymPageChanged(SymPage),
    NavModeChanged(bool),
    ModifiersChanged(ModifierSnapshot),
}
