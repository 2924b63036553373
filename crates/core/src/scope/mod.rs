//! Visibility scopes
//!
//! A scope controls which classpath entries a compiled script can see. Scopes
//! form a tree: a scope sees everything its ancestors export plus its own
//! local entries. Once locked a scope no longer accepts entries.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A single entry on a scope's classpath
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClasspathEntry(String);

impl ClasspathEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClasspathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct ScopeState {
    local: Vec<ClasspathEntry>,
    exported: Vec<ClasspathEntry>,
    locked: bool,
}

#[derive(Debug)]
pub struct Scope {
    id: String,
    parent: Option<Arc<Scope>>,
    state: RwLock<ScopeState>,
}

impl Scope {
    /// Create a scope without a parent
    pub fn root(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            parent: None,
            state: RwLock::new(ScopeState::default()),
        })
    }

    /// Create a scope that sees everything `self` exports
    pub fn child(self: &Arc<Self>, id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            parent: Some(Arc::clone(self)),
            state: RwLock::new(ScopeState::default()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent(&self) -> Option<&Arc<Scope>> {
        self.parent.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, ScopeState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ScopeState>> {
        let state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.locked {
            return Err(Error::ScopeLocked(self.id.clone()));
        }
        Ok(state)
    }

    /// Add entries visible to this scope only
    pub fn add_local(&self, entries: impl IntoIterator<Item = ClasspathEntry>) -> Result<()> {
        let mut state = self.write()?;
        for entry in entries {
            if !state.local.contains(&entry) {
                state.local.push(entry);
            }
        }
        Ok(())
    }

    /// Add entries visible to this scope and its children
    pub fn export(&self, entries: impl IntoIterator<Item = ClasspathEntry>) -> Result<()> {
        let mut state = self.write()?;
        for entry in entries {
            if !state.exported.contains(&entry) {
                state.exported.push(entry);
            }
        }
        Ok(())
    }

    pub fn lock(&self) {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.read().locked
    }

    /// Entries visible to children: the parent's exports followed by our own
    pub fn export_classpath(&self) -> Vec<ClasspathEntry> {
        let mut entries = self
            .parent
            .as_ref()
            .map(|parent| parent.export_classpath())
            .unwrap_or_default();
        for entry in &self.read().exported {
            if !entries.contains(entry) {
                entries.push(entry.clone());
            }
        }
        entries
    }

    /// Entries visible to scripts compiled against this scope
    pub fn local_classpath(&self) -> Vec<ClasspathEntry> {
        let mut entries = self.export_classpath();
        for entry in &self.read().local {
            if !entries.contains(entry) {
                entries.push(entry.clone());
            }
        }
        entries
    }

    /// Digest of the scope id and its visible classpath. Two scopes with the
    /// same fingerprint compile scripts identically.
    pub fn fingerprint(&self) -> String {
        let mut input = self.id.clone();
        for entry in self.local_classpath() {
            input.push('\n');
            input.push_str(entry.as_str());
        }
        format!("{:x}", md5::compute(input.as_bytes()))
    }
}
