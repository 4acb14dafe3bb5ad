use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum FrameSourceError {
    #[error("video not found: {0}")]
    NotFound(PathBuf),
    #[error("sampling rate must be positive, got {0}")]
    InvalidSamplingRate(f64),
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("failed to encode frame {index}: {message}")]
    Encode { index: usize, message: String },
}

/// Turns a video into stills sampled at a fixed rate.
///
/// Frames come back in order with 1-based contiguous indices, and frame `k`
/// carries timestamp `(k - 1) / sampling_rate`.
pub trait FrameSource: Send {
    fn extract(&mut self, video: &Path, sampling_rate: f64) -> Result<Vec<Frame>, FrameSourceError>;
}
