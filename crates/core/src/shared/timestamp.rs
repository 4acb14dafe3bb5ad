/// Seconds into the video for a 1-based frame index sampled at `fps`.
///
/// `fps` must be positive; callers validate it at the configuration boundary.
pub fn frame_timestamp(index: usize, fps: f64) -> f64 {
    debug_assert!(fps > 0.0, "sampling rate must be positive");
    index.saturating_sub(1) as f64 / fps
}

/// Formats seconds as `m:ss`, seconds floored. Display only.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
