pub mod cli;
pub mod commands;
pub mod display;
pub mod report;

// Re-export commonly used items
pub use cli::{Cli, Commands, TargetArg};
pub use commands::{AnalyzeOptions, analyze};
pub use report::{AnalysisReport, EvaluatedStatement, ScriptReport};
