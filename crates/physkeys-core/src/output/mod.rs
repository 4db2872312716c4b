// Physkeys Output Layer
// Commit sink contract and the in-memory reference editor

mod buffer;
mod sink;

pub use buffer::TextBuffer;
pub use sink::CommitSink;
