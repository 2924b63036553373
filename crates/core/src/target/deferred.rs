//! Deferred configuration actions
//!
//! A [`ConfigurationAction`] wraps a `FnOnce`, so it can run at most once no
//! matter which sink ends up holding it.

use super::TargetObject;
use crate::error::Result;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

type ActionFn = Box<dyn FnOnce(&dyn TargetObject) -> Result<()> + Send>;

/// A unit of configuration to run against a target
pub struct ConfigurationAction {
    label: String,
    action: ActionFn,
}

impl ConfigurationAction {
    pub fn new(
        label: impl Into<String>,
        action: impl FnOnce(&dyn TargetObject) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn run(self, target: &dyn TargetObject) -> Result<()> {
        tracing::debug!("Running configuration action {}", self.label);
        (self.action)(target)
    }
}

impl fmt::Debug for ConfigurationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A deferred execution sink targets can delegate to
///
/// Non-deferrable actions run immediately, in the order received. Deferrable
/// actions are queued until [`DeferredConfiguration::realize`]; once the target
/// is configured, further deferrable actions run immediately as well.
#[derive(Debug, Default)]
pub struct DeferredConfiguration {
    pending: Mutex<Vec<ConfigurationAction>>,
    configured: AtomicBool,
}

impl DeferredConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        target: &dyn TargetObject,
        action: ConfigurationAction,
        may_defer: bool,
    ) -> Result<()> {
        if may_defer && !self.is_configured() {
            tracing::debug!(
                "Deferring configuration action {} for {}",
                action.label(),
                target.display_name()
            );
            self.pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(action);
            return Ok(());
        }
        action.run(target)
    }

    /// Run every queued action in the order it was added and mark the target
    /// as configured. Stops at the first failing action; the remaining ones
    /// stay queued.
    pub fn realize(&self, target: &dyn TargetObject) -> Result<()> {
        loop {
            let next = {
                let mut pending = self
                    .pending
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if pending.is_empty() {
                    None
                } else {
                    Some(pending.remove(0))
                }
            };
            match next {
                Some(action) => action.run(target)?,
                None => break,
            }
        }
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }
}
