// Physkeys Core Library
// Key-event processing for physical-keyboard input methods

pub mod action;
pub mod config;
pub mod ctrl;
pub mod event;
pub mod key;
pub mod layout;
pub mod mode;
pub mod modifier;
pub mod output;
pub mod resolve;
pub mod settings;
pub mod state;
pub mod timer;
pub mod transform;

pub use action::KeyAction;
pub use config::{Config, ConfigError};
pub use ctrl::{CtrlCommandDispatcher, CtrlMapping, CtrlTable, EditorAction, KeyKind};
pub use event::{FieldContext, KeyEvent, MetaState};
pub use key::Key;
pub use layout::{KeyChars, KeyLayout, LayoutLookup};
pub use mode::{NavMap, SymLayers, SymPage};
pub use modifier::{Modifier, ModifierIndicator, ModifierSnapshot, ModifierState};
pub use output::{CommitSink, TextBuffer};
pub use settings::{Settings, SettingsError};
pub use timer::{Scheduler, TimerKind, TimerQueue, TimerToken};
pub use transform::{InputEventRouter, Notification, RouterConfig, RouterDecision};
