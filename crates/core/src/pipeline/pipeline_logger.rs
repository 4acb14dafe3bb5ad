use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for scan progress, per-stage timing and counters.
///
/// Keeps use cases free of any particular output mechanism.
pub trait PipelineLogger: Send {
    /// Report how many selected frames have been searched so far.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long one pass of a named stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Add to a named counter (matches found, detect failures, ...).
    fn count(&mut self, name: &str, amount: usize);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. For tests and embedders with their own reporting.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn count(&mut self, _name: &str, _amount: usize) {}
    fn info(&mut self, _message: &str) {}
}

/// Forwards to the `log` facade and keeps enough state for a summary.
///
/// Progress lines are throttled to every `throttle_frames` frames; provider
/// pacing makes each frame slow, so the default is low.
pub struct LogPipelineLogger {
    throttle_frames: usize,
    /// Per stage: number of runs and total milliseconds.
    timings: BTreeMap<String, (usize, f64)>,
    counters: BTreeMap<String, usize>,
    start_time: Instant,
    frames_done: usize,
    total_frames: usize,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            counters: BTreeMap::new(),
            start_time: Instant::now(),
            frames_done: 0,
            total_frames: 0,
        }
    }

    /// Formatted summary, or `None` before any frame was searched.
    pub fn summary_string(&self) -> Option<String> {
        if self.total_frames == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Scan summary ({}/{} frames searched, {elapsed:.1}s total):",
            self.frames_done, self.total_frames
        )];

        for (stage, &(runs, total_ms)) in &self.timings {
            let avg_ms = total_ms / runs.max(1) as f64;
            lines.push(format!(
                "  {stage:10}: {runs:4} runs  avg {avg_ms:8.1}ms  total {total_s:7.1}s",
                total_s = total_ms / 1000.0
            ));
        }

        for (name, value) in &self.counters {
            lines.push(format!("  {name}: {value}"));
        }

        Some(lines.join("\n"))
    }

    /// Runs and total milliseconds recorded for `stage`.
    pub fn stage_totals(&self, stage: &str) -> Option<(usize, f64)> {
        self.timings.get(stage).copied()
    }

    pub fn counter(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(5)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_done = current;
        self.total_frames = total;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Searched {current}/{total} frames ({pct:.0}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        let (runs, total_ms) = self.timings.entry(stage.to_string()).or_default();
        *runs += 1;
        *total_ms += duration_ms;
    }

    fn count(&mut self, name: &str, amount: usize) {
        *self.counters.entry(name.to_string()).or_default() += amount;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
