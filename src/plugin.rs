//! Plugin registration and lifecycle observation.
//!
//! Plugins react to invocation lifecycle events but never control whether
//! the invocation runs. They are held in a process-wide ordered registry;
//! the dispatcher only ever iterates snapshots of it, so registration may
//! race with dispatch without torn reads.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::invocation::BoxError;

/// An observer of the invocation lifecycle.
///
/// All four callbacks default to no-ops so implementors only override the
/// events they care about. A callback returning `Err` short-circuits the
/// remaining plugins of that fan-out; plugin bugs are surfaced, not
/// swallowed.
pub trait Plugin: Send + Sync {
    /// Called before the invocation executes.
    fn before_invocation(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called after the invocation executed without error.
    fn after_invocation(&self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called with the raw failure cause, before classification.
    fn on_invocation_error(
        &self,
        _error: &(dyn std::error::Error + 'static),
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called unconditionally once the invocation has finished.
    fn invocation_finally(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Ordered, append-only plugin collection.
///
/// Readers take a cheap snapshot (a clone of the `Arc` list) and iterate
/// that, so fan-out order is stable even while registration appends
/// concurrently.
pub(crate) struct Registry {
    plugins: RwLock<Arc<Vec<Arc<dyn Plugin>>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            plugins: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub(crate) fn register(&self, plugin: Arc<dyn Plugin>) {
        let mut guard = self.plugins.write();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(plugin);
        *guard = Arc::new(next);
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<dyn Plugin>>> {
        self.plugins.read().clone()
    }

    pub(crate) fn clear(&self) {
        *self.plugins.write() = Arc::new(Vec::new());
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Append a plugin to the process-wide registry.
///
/// Registration order is fan-out order for every lifecycle hook.
pub fn register_plugin(plugin: Arc<dyn Plugin>) {
    REGISTRY.register(plugin);
}

/// Remove every registered plugin. Intended for test isolation.
pub fn clear_plugins() {
    REGISTRY.clear();
}

pub(crate) fn plugins() -> Arc<Vec<Arc<dyn Plugin>>> {
    REGISTRY.snapshot()
}
