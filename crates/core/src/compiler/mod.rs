//! Compile engine interface
//!
//! The pipeline does not compile scripts itself. It describes what to compile
//! with a [`CompileRequest`] and receives a [`ScriptRunner`] it can query and
//! run. [`OutlineScriptCompiler`] is the engine that ships with this crate.

pub mod filter;
pub mod outline_compiler;

pub use filter::{FilterMode, StatementFilter};
pub use outline_compiler::OutlineScriptCompiler;

use crate::{
    error::Result,
    scope::Scope,
    script::Statement,
    services::ServiceRegistry,
    target::{ScriptClass, TargetObject},
    types::ScriptSource,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Extra checks applied while compiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verifier {
    None,
    /// Model rules must be declared as `model { }` blocks
    ModelRuleClosures,
}

/// Data extracted from a script while compiling it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScriptData {
    pub has_imperative_statements: bool,
}

/// Everything a compiler needs to produce a runnable script
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a ScriptSource,
    pub script_class: ScriptClass,
    /// Identifies the compile operation; differs between passes
    pub operation_id: &'a str,
    pub filter: &'a StatementFilter,
    /// Visibility scope the script is compiled against
    pub scope: &'a Scope,
    pub verifier: Verifier,
    /// Whether [`ScriptData`] should be extracted
    pub extract_data: bool,
}

pub trait ScriptCompiler: Send + Sync {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<Arc<dyn ScriptRunner>>;
}

/// A compiled script ready to run
pub trait ScriptRunner: Send + Sync {
    /// The compiled script instance
    fn script(&self) -> Arc<dyn ScriptInstance>;

    fn has_methods(&self) -> bool;

    /// False when running the script would have no observable effect
    fn run_does_something(&self) -> bool;

    /// Data extracted at compile time; default when extraction was not requested
    fn data(&self) -> ScriptData;

    fn run(&self, target: &dyn TargetObject, services: &ServiceRegistry) -> Result<()>;
}

/// A compiled script class, kept by targets that support method inheritance
pub trait ScriptInstance: Send + Sync + fmt::Debug {
    fn script_class(&self) -> ScriptClass;

    /// Display name of the script the instance was compiled from
    fn source_display_name(&self) -> &str;

    fn method_names(&self) -> &[String];

    fn declares_method(&self, name: &str) -> bool {
        self.method_names().iter().any(|m| m == name)
    }
}

/// Evaluates the ordinary statements of a script's final pass
///
/// Registered by the caller as a capability; without one, ordinary statements
/// run as no-ops.
pub trait StatementEvaluator: Send + Sync {
    fn evaluate(
        &self,
        target: &dyn TargetObject,
        statement: &Statement,
        services: &ServiceRegistry,
    ) -> Result<()>;
}
