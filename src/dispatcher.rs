//! Public dispatch entry points.
//!
//! `invoke` runs a task fire-and-forget on the shared worker pool;
//! `invoke_in_thread` runs it synchronously on the caller's thread. Both
//! execute the task under the full lifecycle contract.

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::invocation::Invocation;
use crate::lifecycle;
use crate::pool::WorkerPool;

// The pool is created exactly once, lazily, on the first pooled
// dispatch; concurrent first dispatches race on the OnceCell, never on
// pool construction.
static POOL: OnceCell<WorkerPool> = OnceCell::new();

// Staged configuration consumed at pool creation. `created` is set under
// the same lock inside the init closure, so staging is ordered against
// creation: a config either applies to the pool or is refused.
static STAGED: Lazy<Mutex<StagedConfig>> = Lazy::new(|| {
    Mutex::new(StagedConfig {
        config: PoolConfig::default(),
        created: false,
    })
});

struct StagedConfig {
    config: PoolConfig,
    created: bool,
}

/// Stage the configuration the shared pool will be built from.
///
/// Must run before the first pooled dispatch; once the pool exists its
/// configuration is immutable and this returns [`Error::AlreadyStarted`].
pub fn configure_pool(config: PoolConfig) -> Result<()> {
    config.validate()?;
    let mut staged = STAGED.lock();
    if staged.created {
        return Err(Error::AlreadyStarted);
    }
    staged.config = config;
    Ok(())
}

fn shared_pool() -> Result<&'static WorkerPool> {
    POOL.get_or_try_init(|| {
        let mut staged = STAGED.lock();
        staged.created = true;
        match WorkerPool::new(staged.config.clone()) {
            Ok(pool) => Ok(pool),
            Err(err) => {
                staged.created = false;
                Err(err)
            }
        }
    })
}

/// Run a task on the shared worker pool, fire-and-forget.
///
/// Returns as soon as the task is accepted; there is no completion
/// signal. A saturated pool rejects the submission with
/// [`Error::Saturated`] instead of blocking. A task that later fails is
/// logged after its observers were notified, then dropped.
pub fn invoke<I>(task: I) -> Result<()>
where
    I: Invocation + 'static,
{
    let pool = shared_pool()?;
    pool.submit(Box::new(move || {
        if let Err(err) = lifecycle::run(Box::new(task)) {
            tracing::error!(error = %err, "pooled invocation failed");
        }
    }))
}

/// Run a task synchronously on the caller's thread.
///
/// Blocks for the task's full duration and returns its classified
/// outcome; no pool interaction.
pub fn invoke_in_thread<I>(task: I) -> Result<()>
where
    I: Invocation,
{
    lifecycle::run(Box::new(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_pool_rejects_invalid_config() {
        let config = PoolConfig {
            core_workers: 8,
            max_workers: 2,
            ..PoolConfig::default()
        };
        assert!(matches!(configure_pool(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_configure_pool_stages_then_refuses_after_creation_began() {
        let config = PoolConfig::builder().queue_size(32).build().unwrap();
        assert!(configure_pool(config).is_ok());
        assert_eq!(STAGED.lock().config.queue_size, 32);

        // Mark creation as begun the way the init closure does.
        STAGED.lock().created = true;
        let result = configure_pool(PoolConfig::default());
        STAGED.lock().created = false;
        assert!(matches!(result, Err(Error::AlreadyStarted)));
    }
}
