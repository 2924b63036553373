//! Per-script classpath configuration and plugin repositories
//!
//! Both are populated while the first pass runs and read by the plugin
//! applicator before the second pass compiles.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct HandlerState {
    repositories: Vec<String>,
    classpath: Vec<String>,
}

/// Classpath configuration declared by a script's classpath block
#[derive(Debug, Default)]
pub struct ScriptHandler {
    state: Mutex<HandlerState>,
}

impl ScriptHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HandlerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_repository(&self, url: impl Into<String>) {
        let url = url.into();
        let mut state = self.state();
        if !state.repositories.contains(&url) {
            state.repositories.push(url);
        }
    }

    pub fn add_classpath_dependency(&self, notation: impl Into<String>) {
        let notation = notation.into();
        let mut state = self.state();
        if !state.classpath.contains(&notation) {
            state.classpath.push(notation);
        }
    }

    pub fn repositories(&self) -> Vec<String> {
        self.state().repositories.clone()
    }

    /// Classpath dependencies in declaration order
    pub fn classpath_dependencies(&self) -> Vec<String> {
        self.state().classpath.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    Maven,
    Ivy,
}

/// A repository plugins may be resolved from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginRepository {
    pub kind: RepositoryKind,
    pub url: String,
}

/// Repositories declared by a settings script's `pluginRepositories` block
#[derive(Debug, Default)]
pub struct PluginRepositories {
    repositories: Mutex<Vec<PluginRepository>>,
}

impl PluginRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, repository: PluginRepository) {
        let mut repositories = self
            .repositories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !repositories.contains(&repository) {
            repositories.push(repository);
        }
    }

    pub fn list(&self) -> Vec<PluginRepository> {
        self.repositories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
