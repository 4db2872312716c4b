// Physkeys State
// Modifier controller, pending presses and the per-session state bundle

pub mod modifiers;
pub mod pending;
pub mod session;

pub use modifiers::{ModifierOutcome, ModifierStateController, NavTransition, DOUBLE_TAP_THRESHOLD};
pub use pending::{PendingKeyPress, PendingPresses};
pub use session::SessionState;
