//! The plugin declaration surface seen by `plugins {}` blocks
//!
//! Project scripts get a [`ProjectPluginRequestCollector`]; every other
//! target gets an [`UnsupportedPluginRequestCollector`] whose declarations
//! fail.

use super::PluginRequest;
use crate::{
    error::{Error, Result},
    target::{TargetObject, TargetType},
    types::{Location, PluginId, ScriptSource},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

/// What to do when one script requests the same plugin id twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePluginPolicy {
    /// Keep both requests
    #[default]
    Allow,
    /// Fail with an error naming both declarations
    Reject,
}

#[derive(Debug)]
struct DeclaredPlugin {
    id: PluginId,
    version: Option<String>,
    location: Option<Location>,
}

/// Handle returned by a declaration; accepts an optional version
#[derive(Debug, Clone)]
pub struct PluginDependencySpec {
    inner: Arc<Mutex<DeclaredPlugin>>,
}

impl PluginDependencySpec {
    fn new(id: PluginId, location: Option<Location>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DeclaredPlugin {
                id,
                version: None,
                location,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, DeclaredPlugin> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pin the requested version. Empty versions are rejected.
    pub fn set_version(&self, version: &str) -> Result<&Self> {
        if version.is_empty() {
            return Err(Error::InvalidArgument(
                "plugin version cannot be null or empty".to_string(),
            ));
        }
        self.state().version = Some(version.to_string());
        Ok(self)
    }

    pub fn id(&self) -> PluginId {
        self.state().id.clone()
    }

    pub fn version(&self) -> Option<String> {
        self.state().version.clone()
    }
}

/// Declaration surface of a `plugins {}` block
pub trait PluginDependenciesSpec: Send + Sync {
    fn declare_at(&self, id: &str, location: Option<Location>) -> Result<PluginDependencySpec>;

    fn declare(&self, id: &str) -> Result<PluginDependencySpec> {
        self.declare_at(id, None)
    }

    /// Reserved for declarations applying to every project. Collects nothing:
    /// nested scoping is handled by the projects' own scripts.
    fn all_projects(
        &self,
        _configure: &dyn Fn(&dyn PluginDependenciesSpec) -> Result<()>,
    ) -> Result<()> {
        Ok(())
    }

    /// Reserved for declarations applying to direct sub-projects. Collects
    /// nothing, see [`PluginDependenciesSpec::all_projects`].
    fn sub_projects(
        &self,
        _configure: &dyn Fn(&dyn PluginDependenciesSpec) -> Result<()>,
    ) -> Result<()> {
        Ok(())
    }
}

/// A declaration surface that can turn its declarations into requests
pub trait PluginRequestCollector: PluginDependenciesSpec {
    /// Requests in declaration order. Call once, after the first pass ran.
    fn collect(&self) -> Result<Vec<PluginRequest>>;

    fn as_dependencies_spec(self: Arc<Self>) -> Arc<dyn PluginDependenciesSpec>;
}

/// Pick the collector for a target: only projects support plugin requests
pub fn collector_for(
    source: &ScriptSource,
    target: &dyn TargetObject,
    policy: DuplicatePluginPolicy,
) -> Arc<dyn PluginRequestCollector> {
    match target.target_type() {
        TargetType::Project => Arc::new(
            ProjectPluginRequestCollector::new(source.display_name(), target.display_name())
                .with_policy(policy),
        ),
        TargetType::Settings | TargetType::Build | TargetType::Other => {
            Arc::new(UnsupportedPluginRequestCollector::new(target.display_name()))
        }
    }
}

pub struct ProjectPluginRequestCollector {
    script_display_name: String,
    target_name: String,
    policy: DuplicatePluginPolicy,
    specs: Mutex<Vec<PluginDependencySpec>>,
    collected: AtomicBool,
}

impl ProjectPluginRequestCollector {
    pub fn new(script_display_name: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            script_display_name: script_display_name.into(),
            target_name: target_name.into(),
            policy: DuplicatePluginPolicy::default(),
            specs: Mutex::new(Vec::new()),
            collected: AtomicBool::new(false),
        }
    }

    pub fn with_policy(mut self, policy: DuplicatePluginPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn specs(&self) -> MutexGuard<'_, Vec<PluginDependencySpec>> {
        self.specs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PluginDependenciesSpec for ProjectPluginRequestCollector {
    fn declare_at(&self, id: &str, location: Option<Location>) -> Result<PluginDependencySpec> {
        // requests are fixed once collected
        if self.collected.load(Ordering::Acquire) {
            return Err(Error::UnsupportedOperation(format!(
                "cannot request plugin '{id}' for {} from {}: plugin requests are only supported in the plugins {{}} block of a top-level project build script",
                self.target_name, self.script_display_name
            )));
        }
        let spec = PluginDependencySpec::new(PluginId::of(id)?, location);
        self.specs().push(spec.clone());
        Ok(spec)
    }
}

impl PluginRequestCollector for ProjectPluginRequestCollector {
    fn collect(&self) -> Result<Vec<PluginRequest>> {
        self.collected.store(true, Ordering::Release);
        let requests = self
            .specs()
            .iter()
            .map(|spec| {
                let state = spec.state();
                PluginRequest::new(
                    state.id.clone(),
                    state.version.clone(),
                    &self.script_display_name,
                )
                .map(|request| request.with_location(state.location))
            })
            .collect::<Result<Vec<_>>>()?;

        if self.policy == DuplicatePluginPolicy::Reject {
            let mut first_by_id: HashMap<&PluginId, &PluginRequest> = HashMap::new();
            for request in &requests {
                if let Some(first) = first_by_id.insert(request.id(), request) {
                    return Err(Error::DuplicatePluginRequest {
                        id: request.id().to_string(),
                        first: first.declaration_site(),
                        second: request.declaration_site(),
                    });
                }
            }
        }

        tracing::debug!(
            "Collected {} plugin requests from {} for {}",
            requests.len(),
            self.script_display_name,
            self.target_name
        );
        Ok(requests)
    }

    fn as_dependencies_spec(self: Arc<Self>) -> Arc<dyn PluginDependenciesSpec> {
        self
    }
}

/// Collector for targets where `plugins {}` is not allowed
pub struct UnsupportedPluginRequestCollector {
    target_name: String,
}

impl UnsupportedPluginRequestCollector {
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
        }
    }
}

impl PluginDependenciesSpec for UnsupportedPluginRequestCollector {
    fn declare_at(&self, id: &str, _location: Option<Location>) -> Result<PluginDependencySpec> {
        Err(Error::UnsupportedOperation(format!(
            "cannot request plugin '{id}' for {}: plugin requests are only supported in project build scripts",
            self.target_name
        )))
    }
}

impl PluginRequestCollector for UnsupportedPluginRequestCollector {
    fn collect(&self) -> Result<Vec<PluginRequest>> {
        Ok(Vec::new())
    }

    fn as_dependencies_spec(self: Arc<Self>) -> Arc<dyn PluginDependenciesSpec> {
        self
    }
}
