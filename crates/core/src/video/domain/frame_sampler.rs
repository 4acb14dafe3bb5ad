use std::iter::StepBy;
use std::slice::Iter;

use crate::shared::constants::DEFAULT_STEP_SIZE;
use crate::shared::frame::Frame;

/// Picks which extracted frames are submitted for recognition: every
/// `step`-th frame, starting with the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSampler {
    step: usize,
}

impl FrameSampler {
    pub fn new(step: usize) -> Result<Self, &'static str> {
        if step < 1 {
            return Err("step must be >= 1");
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Frames at 0-based positions `p` with `p % step == 0`.
    pub fn select<'a>(&self, frames: &'a [Frame]) -> StepBy<Iter<'a, Frame>> {
        frames.iter().step_by(self.step)
    }

    /// How many of `total` frames `select` yields.
    pub fn selected_count(&self, total: usize) -> usize {
        total.div_ceil(self.step)
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP_SIZE,
        }
    }
}
