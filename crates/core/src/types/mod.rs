pub mod plugin_id;
pub mod position;
pub mod source;

// Re-export commonly used types
pub use plugin_id::PluginId;
pub use position::Location;
pub use source::{ResourceLocation, ScriptSource};
