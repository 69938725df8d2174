//! Status macros.
//!
//! Thin wrappers over `tracing` so every crate reports progress the same way.
//! The terminal formatter picks the status symbol from the level, and renders
//! events emitted under [`SUCCESS_TARGET`] with the success symbol.

/// Target used by [`success!`](crate::success) events.
pub const SUCCESS_TARGET: &str = "interlace::success";

/// Target used for raw, unprefixed terminal output.
pub const PRINT_TARGET: &str = "interlace::print";

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "interlace::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::__tracing::error!($($arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::__tracing::debug!($($arg)*)
    };
}
