//! Plugin requests: declared in pass one, applied between the passes

pub mod applicator;
pub mod collector;
pub mod request;

pub use applicator::{CatalogEntry, CatalogPluginApplicator, PluginCatalog, PluginRequestApplicator};
pub use collector::{
    DuplicatePluginPolicy, PluginDependenciesSpec, PluginDependencySpec, PluginRequestCollector,
    ProjectPluginRequestCollector, UnsupportedPluginRequestCollector, collector_for,
};
pub use request::PluginRequest;
