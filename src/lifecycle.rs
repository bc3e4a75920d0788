//! The invocation lifecycle contract.
//!
//! Every invocation, synchronous or pooled, runs through [`run`]:
//! `before` then `execute` then `after`, with `on_failure` replacing the
//! `after` path on any error and `finally` running unconditionally at the
//! end. Each hook fans out to the registered plugins in registration
//! order.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::invocation::{BoxError, Invocation};
use crate::plugin::{self, Plugin};

type CheckFn = dyn Fn() -> std::result::Result<(), BoxError> + Send + Sync;

// Startup/hot-reload collaborator, run before any plugin sees the
// invocation. Absent means the application is always ready.
static READINESS_CHECK: Lazy<RwLock<Option<Arc<CheckFn>>>> = Lazy::new(|| RwLock::new(None));

// Optional diagnostic hook run at the tail of `after`; a failure here is
// a programming-error signal and propagates like any other hook error.
static CONSISTENCY_CHECK: Lazy<RwLock<Option<Arc<CheckFn>>>> = Lazy::new(|| RwLock::new(None));

/// Register the readiness collaborator invoked at the top of `before`.
pub fn set_readiness_check<F>(check: F)
where
    F: Fn() -> std::result::Result<(), BoxError> + Send + Sync + 'static,
{
    *READINESS_CHECK.write() = Some(Arc::new(check));
}

/// Register the diagnostic consistency check run after a successful
/// invocation's plugin fan-out.
pub fn set_consistency_check<F>(check: F)
where
    F: Fn() -> std::result::Result<(), BoxError> + Send + Sync + 'static,
{
    *CONSISTENCY_CHECK.write() = Some(Arc::new(check));
}

/// Remove the readiness and consistency collaborators. Intended for test
/// isolation.
pub fn clear_checks() {
    *READINESS_CHECK.write() = None;
    *CONSISTENCY_CHECK.write() = None;
}

fn before(plugins: &[Arc<dyn Plugin>]) -> std::result::Result<(), BoxError> {
    // Snapshot first: the read guard must not be held while the callback
    // runs, since a readiness check may re-register collaborators.
    let check = READINESS_CHECK.read().clone();
    if let Some(check) = check {
        check()?;
    }
    for plugin in plugins {
        plugin.before_invocation()?;
    }
    Ok(())
}

fn after(plugins: &[Arc<dyn Plugin>]) -> std::result::Result<(), BoxError> {
    for plugin in plugins {
        plugin.after_invocation()?;
    }
    let check = CONSISTENCY_CHECK.read().clone();
    if let Some(check) = check {
        check()?;
    }
    Ok(())
}

fn on_failure(plugins: &[Arc<dyn Plugin>], cause: BoxError) -> Error {
    for plugin in plugins {
        if let Err(err) = plugin.on_invocation_error(cause.as_ref()) {
            // A broken exception handler supersedes the original cause.
            return Error::classify(err);
        }
    }
    Error::classify(cause)
}

fn finally(plugins: &[Arc<dyn Plugin>]) -> std::result::Result<(), BoxError> {
    for plugin in plugins {
        plugin.invocation_finally()?;
    }
    Ok(())
}

/// Run one invocation under the full lifecycle contract.
///
/// Exactly one of the `after` / `on_failure` paths runs; `finally` always
/// runs, and its own failure supersedes the in-flight outcome.
pub(crate) fn run(task: Box<dyn Invocation + '_>) -> Result<()> {
    let plugins = plugin::plugins();

    let body = (|| {
        before(&plugins)?;
        task.execute()?;
        after(&plugins)
    })();

    let outcome = match body {
        Ok(()) => Ok(()),
        Err(cause) => Err(on_failure(&plugins, cause)),
    };

    match finally(&plugins) {
        Ok(()) => outcome,
        Err(cause) => Err(Error::classify(cause)),
    }
}
