//! # Interlace Common
//!
//! Types shared by every crate in the workspace:
//!
//! * **[`config`]**: the validated, typed run configuration.
//! * **[`error`]**: the validation error taxonomy.
//! * **[`target`]**: target specifications and their expansion into a [`target::TargetSet`].
//! * **[`input`]**: readers for line-delimited list inputs.
//! * **[`log`]**: status macros (`info!`, `success!`, ...) on top of `tracing`.

pub mod config;
pub mod error;
pub mod input;
pub mod log;
pub mod target;

#[doc(hidden)]
pub use tracing as __tracing;
