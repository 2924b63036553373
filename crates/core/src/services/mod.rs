//! Services shared with running scripts

pub mod registry;

pub use registry::{ServiceRegistry, ServiceRegistryBuilder};
