//! Script outline, statement classification and first-pass block readers

pub mod blocks;
pub mod handler;
pub mod outline;
pub mod statement;

// Re-export commonly used items
pub use handler::{PluginRepositories, PluginRepository, RepositoryKind, ScriptHandler};
pub use outline::{Body, Statement};
pub use statement::StatementKind;
