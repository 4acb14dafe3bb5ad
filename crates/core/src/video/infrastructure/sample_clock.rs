/// Tolerance for decoder timestamps that land a hair before a sample point.
const TIME_EPSILON: f64 = 1e-6;

/// Maps decoded frame times onto a fixed-rate output grid.
///
/// Sample `k` (1-based) is due at `(k - 1) / rate`. A decoded frame fills every
/// sample that has come due by its time, so a gap in the source repeats the
/// frame after it and a dense source drops the frames between sample points.
#[derive(Clone, Debug)]
pub struct SampleClock {
    rate: f64,
    emitted: usize,
}

impl SampleClock {
    pub fn new(rate: f64) -> Self {
        Self { rate, emitted: 0 }
    }

    /// Number of samples the frame decoded at `time` seconds should fill.
    pub fn samples_due(&mut self, time: f64) -> usize {
        let mut due = 0;
        while self.next_sample_time() <= time + TIME_EPSILON {
            self.emitted += 1;
            due += 1;
        }
        due
    }

    fn next_sample_time(&self) -> f64 {
        self.emitted as f64 / self.rate
    }
}
