// Physkeys Modes
// SYM paging and navigation mode

pub mod nav;
pub mod sym;

pub use nav::{NavMap, NavModeController};
pub use sym::{SymLayers, SymPage, SymPager};
