pub mod nav;

// ============================================================================
// Profiling Macros
// ============================================================================

/// Conditionally log messages based on tick interval when perf_stats feature is enabled.
///
/// Logs every 100 [`NavTick`](crate::nav::NavTick)s. Without the perf_stats
/// feature this expands to an empty block and the arguments are never evaluated.
///
/// # Example
/// ```ignore
/// profile_log!(tick, "Goal bounds: {}/{} sources", done, total);
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {
        if $tick.0 % 100 == 0 {
            bevy::prelude::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($tick:expr, $($arg:tt)*) => {};
}
