// Physkeys Character Resolution
// Timer-driven long-press and multi-tap resolvers

pub mod long_press;
pub mod multi_tap;

pub use long_press::{LongPressResolver, DEFAULT_LONG_PRESS_THRESHOLD};
pub use multi_tap::{MultiTapCycle, MultiTapResolver, MultiTapTable, DEFAULT_MULTI_TAP_WINDOW};
