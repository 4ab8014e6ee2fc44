//! Descriptive statistics used by the aggregator.

/// Arithmetic mean. Returns `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile `q` (clamped to `0.0..=1.0`) using linear interpolation between
/// the two closest ranks.
///
/// For sorted values `v[0..n]` the position is `h = q * (n - 1)` and the
/// result is `v[floor(h)] + (h - floor(h)) * (v[ceil(h)] - v[floor(h)])`.
/// Returns `None` for an empty slice.
pub fn percentile_linear(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let h = q * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - h.floor();

    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Round to `decimals` places, ties to even.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Round to two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}
