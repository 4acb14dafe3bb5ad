use std::time::Duration;

/// Upper bound of the provider's native confidence scale.
pub const PROVIDER_CONFIDENCE_SCALE: f64 = 100.0;

/// Raw provider confidence a search hit must exceed to count as a match.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 75.0;

/// Frames per second emitted by the frame source.
pub const DEFAULT_SAMPLING_RATE: f64 = 0.5;

/// Submit every Nth extracted frame to the provider.
pub const DEFAULT_STEP_SIZE: usize = 3;

/// Detections of one subject closer than this (seconds) collapse into one.
pub const DEFAULT_DEDUP_WINDOW: f64 = 5.0;

pub const DEFAULT_PRE_CALL_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_POST_SUCCESS_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Upper bound accepted for `max_attempts` in settings.
pub const MAX_ATTEMPTS_LIMIT: u32 = 20;
/// Backoff never waits longer than this between retries.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);
pub const DEFAULT_INTER_SUBJECT_DELAY: Duration = Duration::from_secs(2);

pub const DEFAULT_PROVIDER_ENDPOINT: &str = "https://api-us.faceplusplus.com/facepp/v3";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest edge of frames uploaded to the provider, in pixels.
pub const DEFAULT_MAX_FRAME_DIMENSION: u32 = 1920;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];
