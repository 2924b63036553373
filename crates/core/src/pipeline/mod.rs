//! The two-pass script pipeline
//!
//! [`ScriptPluginFactory`] holds what every script application shares.
//! [`ScriptPlugin::apply`] runs one script against one target and reports
//! what happened in an [`ApplyOutcome`].

pub mod factory;

pub use factory::{ScriptPlugin, ScriptPluginFactory};

use crate::plugin::PluginRequest;
use crate::target::ScriptTargetKind;
use serde::Serialize;

/// What was done with the compiled final pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum Configuration {
    /// The script had nothing to run
    Skipped,
    /// Handed to the target's configuration sink
    Submitted { may_defer: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub initial_kind: ScriptTargetKind,
    pub final_kind: ScriptTargetKind,
    /// Requests collected by the first pass, in declaration order
    pub plugin_requests: Vec<PluginRequest>,
    pub script_attached: bool,
    pub configuration: Configuration,
}
