//! Conversion of accumulative counters into per-second rates

use std::time::Duration;

/// Calculates the rate (in hertz) at which a counter went from `prev` to `curr` over `interval_secs`
///
/// Kernel counters only increase, except when they are reset or when they race on dyn-tick kernels.
/// If `curr` is less than `prev`, the rate is 0 rather than the result of an underflow.
/// A rate is also 0 if `interval_secs` is not a strictly positive, finite amount of seconds.
///
/// # Arguments
///  * `prev`: The value of the counter at the beginning of the interval
///  * `curr`: The value of the counter at the end of the interval
///  * `interval_secs`: The duration of the interval, in seconds
pub fn per_sec(prev: u64, curr: u64, interval_secs: f64) -> f64 {
    if curr < prev || !is_valid_interval(interval_secs) {
        return 0.;
    }

    (curr - prev) as f64 / interval_secs
}

/// Returns the duration of an interval in seconds, as used by [`per_sec()`]
pub fn interval_secs(interval: Duration) -> f64 {
    interval.as_secs_f64()
}

fn is_valid_interval(interval_secs: f64) -> bool {
    interval_secs.is_finite() && interval_secs > 0.
}
