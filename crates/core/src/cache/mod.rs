//! Caches shared across script applications

pub mod compiled_scripts;
pub mod interner;

pub use compiled_scripts::{CacheStats, CachingScriptCompiler};
pub use interner::StringInterner;
