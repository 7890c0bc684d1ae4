//! Layered tool configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config (~/.config/deep-research/config.toml, or --config)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{default_config_path, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
