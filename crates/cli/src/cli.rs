use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use scriptstage_core::TargetType;
use std::path::PathBuf;

use crate::commands::{AnalyzeOptions, analyze_command, init_command};

#[derive(Parser, Debug)]
#[command(name = "scriptstage")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Kind of object a script is applied to
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetArg {
    Project,
    Settings,
    Init,
    Other,
}

impl From<TargetArg> for TargetType {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Project => TargetType::Project,
            TargetArg::Settings => TargetType::Settings,
            TargetArg::Init => TargetType::Build,
            TargetArg::Other => TargetType::Other,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage a script (or every script under a directory) and report both passes
    #[command(visible_alias = "a")]
    Analyze {
        /// Script file or directory to analyze
        path: PathBuf,

        /// Target to apply the scripts to (inferred from the file name by default)
        #[arg(short, long, value_enum)]
        target: Option<TargetArg>,

        /// Treat scripts as nested rather than top level
        #[arg(long)]
        nested: bool,

        /// Configuration file (searched upwards from the path by default)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a default scriptstage configuration
    Init {
        /// Directory to write the configuration to (defaults to current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Analyze {
                path,
                target,
                nested,
                config,
                json,
            } => analyze_command(&AnalyzeOptions {
                path,
                target: target.map(TargetType::from),
                top_level: !nested,
                config,
                json,
            }),
            Commands::Init { cwd, force } => init_command(cwd, force),
        }
    }
}
