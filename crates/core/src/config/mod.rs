//! Configuration management for scriptstage

mod settings;

pub use settings::{CONFIG_FILE_NAMES, ScriptNames, StageConfig};
