// Physkeys Config API
// Keyboard tables loaded from physkeys.toml

pub mod parser;

pub use parser::{Config, ConfigError, ConfigToml};
