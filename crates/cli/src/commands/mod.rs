pub mod analyze;
pub mod init;

pub use analyze::{AnalyzeOptions, analyze, analyze_command};
pub use init::init_command;
