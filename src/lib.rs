//! scriptstage - Two-pass staging of build configuration scripts
//!
//! Re-exports [`scriptstage_core`]; the end-to-end pipeline tests live in
//! this package's `tests/` directory.
pub use scriptstage_core::*;
