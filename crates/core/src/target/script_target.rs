use super::{ConfigurationAction, ScriptTargetKind, TargetType};
use crate::{compiler::ScriptInstance, error::Result};
use std::sync::Arc;

/// An object a script can be applied to
///
/// The object persists beyond a script application and owns the sink that
/// receives the script's final configuration action.
pub trait TargetObject: Send + Sync {
    fn target_type(&self) -> TargetType;

    /// Human readable name used in logs and diagnostics
    fn display_name(&self) -> String;

    /// Keep a compiled script so later scripts can resolve its methods.
    /// Targets that do not support method inheritance ignore it.
    fn attach_script(&self, _script: Arc<dyn ScriptInstance>) {}

    /// Deferred execution sink.
    ///
    /// When `may_defer` is false the action must run before the target is
    /// considered configured, in the order received relative to other
    /// non-deferrable actions. When true the target may run it now or later,
    /// but still before it is considered configured.
    fn add_configuration(&self, action: ConfigurationAction, may_defer: bool) -> Result<()>;
}

/// A target object viewed through the kind resolved for one pass
#[derive(Clone, Copy)]
pub struct ScriptTarget<'t> {
    kind: ScriptTargetKind,
    target: &'t dyn TargetObject,
}

impl<'t> ScriptTarget<'t> {
    pub fn new(kind: ScriptTargetKind, target: &'t dyn TargetObject) -> Self {
        Self { kind, target }
    }

    /// Attach `script` if this kind supports method inheritance. Returns
    /// whether the script was attached.
    pub fn attach_script(&self, script: Arc<dyn ScriptInstance>) -> bool {
        if !self.kind.supports_method_inheritance() {
            return false;
        }
        self.target.attach_script(script);
        true
    }

    pub fn add_configuration(&self, action: ConfigurationAction, may_defer: bool) -> Result<()> {
        self.target.add_configuration(action, may_defer)
    }
}

impl std::fmt::Debug for ScriptTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptTarget")
            .field("kind", &self.kind)
            .field("target", &self.target.display_name())
            .finish()
    }
}
