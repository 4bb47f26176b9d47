/// Compute transfer progress as a percentage, capped at 100.
///
/// A zero total yields 0 so callers never divide by zero.
#[must_use]
pub fn progress_percent(done: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((done as f64 / total as f64) * 100.0).min(100.0) as f32
}
