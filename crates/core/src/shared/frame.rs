/// A single sampled still from a video: encoded image bytes plus its
/// position in the sampled sequence.
///
/// Indices are 1-based and contiguous as emitted by the frame source; the
/// timestamp is fixed at construction and never rounded.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    index: usize,
    timestamp: f64,
    image: Vec<u8>,
}

impl Frame {
    pub fn new(index: usize, timestamp: f64, image: Vec<u8>) -> Self {
        debug_assert!(index >= 1, "frame indices are 1-based");
        Self {
            index,
            timestamp,
            image,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Seconds from the start of the video, full precision.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Encoded image bytes (JPEG for frames produced by the ffmpeg source).
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Stable identifier used in detection output, e.g. `frame-0004`.
    pub fn name(&self) -> String {
        format!("frame-{:04}", self.index)
    }
}
