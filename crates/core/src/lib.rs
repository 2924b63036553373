//! scriptstage - Two-pass staging of build configuration scripts
//!
//! A script is applied to a target in two passes:
//! - the first pass runs only the blocks that change the script's own
//!   environment (`buildscript {}`, `plugins {}`, `pluginRepositories {}`)
//!   against a base scope
//! - the plugin requests it collected are resolved into the target scope
//! - the second pass compiles the rest of the script against that scope and
//!   hands it to the target, to run now or once the target is configured
pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod plugin;
pub mod scope;
pub mod script;
pub mod services;
pub mod target;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use types::*;

// Re-export main API components
pub use compiler::{ScriptCompiler, ScriptRunner, StatementEvaluator};
pub use config::StageConfig;
pub use pipeline::{ApplyOutcome, Configuration, ScriptPlugin, ScriptPluginFactory};
pub use plugin::{PluginRequest, PluginRequestApplicator};
pub use scope::Scope;
pub use services::ServiceRegistry;
pub use target::{ScriptTargetKind, TargetObject, TargetType};
