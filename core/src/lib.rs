//! # Interlace Core
//!
//! Turns targets and command templates into tasks and runs them in parallel.
//!
//! * **[`template`]**: placeholder substitution for a single command.
//! * **[`pools`]**: the rotating proxy and random-line sources shared by all tasks.
//! * **[`generator`]**: the target × command × repeat task stream.
//! * **[`pool`]**: the bounded worker pool that executes the stream.
//! * **[`report`]**: task outcomes and the [`report::ReportingSink`] port.

pub mod generator;
pub mod pool;
pub mod pools;
pub mod report;
pub mod template;

pub use generator::{Task, TaskGenerator, Tasks};
pub use pool::{PoolError, PoolSettings, PoolState, WorkerPool};
pub use report::{PoolSummary, ReportingSink, TaskOutcome, TaskStatus};
pub use template::SubstitutionContext;
