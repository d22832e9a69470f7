//! Exact fixed-point helpers.
//!
//! Averages, percentages and densities are ratios of small integers, so they
//! are rounded half-up in integer arithmetic and only converted to `f64` at
//! the end. This keeps `6.05` from turning into `6.0` through binary float
//! error.

/// Round `num / den` half-up to `scale` units (10 = one decimal place,
/// 1000 = three). `den` must be non-zero.
pub(crate) fn round_half_up(num: u64, den: u64, scale: u64) -> u64 {
    debug_assert!(den > 0, "round_half_up with zero denominator");
    (2 * num * scale + den) / (2 * den)
}

/// Convert a scaled integer back to a float.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn unscale(value: u64, scale: u64) -> f64 {
    value as f64 / scale as f64
}

/// `num / den` rounded half-up to one decimal place.
pub(crate) fn one_decimal(num: u64, den: u64) -> f64 {
    unscale(round_half_up(num, den, 10), 10)
}

/// `num / den × 100` rounded half-up to one decimal place.
pub(crate) fn percentage(num: u64, den: u64) -> f64 {
    unscale(round_half_up(num * 100, den, 10), 10)
}
