//! Locates enrolled subjects in a video through a remote face recognition
//! provider: frame sampling, paced and retried provider calls, per-subject
//! gallery search and temporal deduplication of the resulting detections.

pub mod pipeline;
pub mod recognition;
pub mod shared;
pub mod video;
