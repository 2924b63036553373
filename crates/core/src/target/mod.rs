//! Script targets
//!
//! A script configures some object: a project, the settings, the global build
//! (init scripts) or anything else it is applied to. Which of those it is,
//! together with whether the script is top level and which pass is running,
//! decides the [`ScriptTargetKind`].

pub mod deferred;
pub mod script_target;

pub use deferred::{ConfigurationAction, DeferredConfiguration};
pub use script_target::{ScriptTarget, TargetObject};

use crate::script::StatementKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The concrete type of the object a script is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Project,
    Settings,
    /// The global build object that init scripts configure
    Build,
    Other,
}

/// Which of the two compile passes is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Initial,
    Final,
}

/// Description of the script class a compiler should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptClass {
    ProjectScript,
    SettingsScript,
    InitScript,
    DefaultScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTargetKind {
    InitialProject,
    FinalProject,
    InitialSettings,
    FinalSettings,
    InitScript,
    Generic,
}

const PROJECT_SPECIAL: &[StatementKind] =
    &[StatementKind::ClasspathBlock, StatementKind::PluginsBlock];
const SETTINGS_SPECIAL: &[StatementKind] = &[
    StatementKind::ClasspathBlock,
    StatementKind::PluginRepositoriesBlock,
];
const INIT_SPECIAL: &[StatementKind] = &[StatementKind::ClasspathBlock];

impl ScriptTargetKind {
    /// Pick the target kind. Total and free of side effects.
    pub fn resolve(target_type: TargetType, top_level: bool, pass: Pass) -> Self {
        match (target_type, top_level, pass) {
            (TargetType::Project, true, Pass::Initial) => ScriptTargetKind::InitialProject,
            (TargetType::Project, true, Pass::Final) => ScriptTargetKind::FinalProject,
            (TargetType::Build, true, _) => ScriptTargetKind::InitScript,
            (TargetType::Settings, true, Pass::Initial) => ScriptTargetKind::InitialSettings,
            (TargetType::Settings, true, Pass::Final) => ScriptTargetKind::FinalSettings,
            _ => ScriptTargetKind::Generic,
        }
    }

    /// Stable identifier, also used to derive compile operation ids
    pub fn id(&self) -> &'static str {
        match self {
            ScriptTargetKind::InitialProject => "cp_proj",
            ScriptTargetKind::FinalProject => "proj",
            ScriptTargetKind::InitialSettings => "cp_settings",
            ScriptTargetKind::FinalSettings => "settings",
            ScriptTargetKind::InitScript => "init",
            ScriptTargetKind::Generic => "dsl",
        }
    }

    /// Whether a compiled script may be attached to the target so that later
    /// scripts can resolve methods against it
    pub fn supports_method_inheritance(&self) -> bool {
        matches!(self, ScriptTargetKind::FinalProject)
    }

    /// Statement kinds extracted and run by the initial pass
    pub fn special_kinds(&self) -> &'static [StatementKind] {
        match self {
            ScriptTargetKind::InitialProject | ScriptTargetKind::FinalProject => PROJECT_SPECIAL,
            ScriptTargetKind::InitialSettings | ScriptTargetKind::FinalSettings => SETTINGS_SPECIAL,
            ScriptTargetKind::InitScript => INIT_SPECIAL,
            ScriptTargetKind::Generic => &[],
        }
    }

    pub fn recognizes(&self, kind: StatementKind) -> bool {
        self.special_kinds().contains(&kind)
    }

    pub fn script_class(&self) -> ScriptClass {
        match self {
            ScriptTargetKind::InitialProject | ScriptTargetKind::FinalProject => {
                ScriptClass::ProjectScript
            }
            ScriptTargetKind::InitialSettings | ScriptTargetKind::FinalSettings => {
                ScriptClass::SettingsScript
            }
            ScriptTargetKind::InitScript => ScriptClass::InitScript,
            ScriptTargetKind::Generic => ScriptClass::DefaultScript,
        }
    }

    /// Name of the block that declares the script's own classpath
    pub fn classpath_block_name(&self) -> &'static str {
        match self {
            ScriptTargetKind::InitScript => "initscript",
            _ => "buildscript",
        }
    }

    /// `None` for single-pass kinds
    pub fn pass(&self) -> Option<Pass> {
        match self {
            ScriptTargetKind::InitialProject | ScriptTargetKind::InitialSettings => {
                Some(Pass::Initial)
            }
            ScriptTargetKind::FinalProject | ScriptTargetKind::FinalSettings => Some(Pass::Final),
            ScriptTargetKind::InitScript | ScriptTargetKind::Generic => None,
        }
    }

    /// The kind the same target resolves to in the other pass
    pub fn counterpart(&self) -> Self {
        match self {
            ScriptTargetKind::InitialProject => ScriptTargetKind::FinalProject,
            ScriptTargetKind::FinalProject => ScriptTargetKind::InitialProject,
            ScriptTargetKind::InitialSettings => ScriptTargetKind::FinalSettings,
            ScriptTargetKind::FinalSettings => ScriptTargetKind::InitialSettings,
            other => *other,
        }
    }
}

impl fmt::Display for ScriptTargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
