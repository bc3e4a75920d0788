//! INVOKER - Task-Invocation Dispatcher
//!
//! A small dispatcher that runs units of application work either
//! synchronously or on a bounded worker pool, wrapping every run in a
//! fixed lifecycle of hooks so registered plugins can observe each
//! invocation without the invocation knowing about them.
//!
//! # Quick Start
//!
//! ```no_run
//! use invoker::{invoke, invoke_in_thread, BoxError};
//!
//! // Fire-and-forget on the shared worker pool.
//! invoke(|| -> Result<(), BoxError> {
//!     println!("running on a worker");
//!     Ok(())
//! }).unwrap();
//!
//! // Synchronous, on the caller's thread.
//! invoke_in_thread(|| -> Result<(), BoxError> { Ok(()) }).unwrap();
//! ```
//!
//! # Lifecycle
//!
//! Every invocation runs `before -> execute -> after`, with `on_failure`
//! replacing the `after` path on any error and `finally` running
//! unconditionally. Each hook fans out to the registered [`Plugin`]s in
//! registration order; a failing callback short-circuits the remainder
//! of that fan-out.
//!
//! # Pool
//!
//! The shared pool is created exactly once, lazily, on the first call to
//! [`invoke`]. It keeps `core_workers` threads alive, grows up to
//! `max_workers` under backlog, retires idle extras after the keepalive
//! timeout, and rejects submissions with [`Error::Saturated`] once
//! `queue_size` tasks are in flight. Submission never blocks.

#![warn(missing_debug_implementations)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod invocation;
pub mod lifecycle;
pub mod plugin;
pub mod pool;

// Re-export key types at crate root
pub use config::{PoolConfig, PoolConfigBuilder};
pub use dispatcher::{configure_pool, invoke, invoke_in_thread};
pub use error::{Error, Result};
pub use invocation::{BoxError, Invocation};
pub use lifecycle::{clear_checks, set_consistency_check, set_readiness_check};
pub use plugin::{clear_plugins, register_plugin, Plugin};
pub use pool::WorkerPool;
