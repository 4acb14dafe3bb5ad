use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::bounding_box_resolver::BoxSelection;
use crate::recognition::domain::retry_policy::RetryPolicy;
use crate::shared::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_DEDUP_WINDOW,
    DEFAULT_INTER_SUBJECT_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_FRAME_DIMENSION,
    DEFAULT_POST_SUCCESS_DELAY, DEFAULT_PRE_CALL_DELAY, DEFAULT_PROVIDER_ENDPOINT,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY, DEFAULT_SAMPLING_RATE, DEFAULT_STEP_SIZE,
    MAX_ATTEMPTS_LIMIT, PROVIDER_CONFIDENCE_SCALE,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for a scan. Every field has a default, so a settings file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub request_timeout_ms: u64,
    pub pre_call_delay_ms: u64,
    pub post_success_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub inter_subject_delay_ms: u64,
    /// Raw provider confidence (0–100) a hit must exceed.
    pub confidence_threshold: f64,
    pub sampling_rate: f64,
    pub step: usize,
    pub dedup_window: f64,
    pub box_selection: BoxSelection,
    /// 0 disables downscaling.
    pub max_frame_dimension: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_PROVIDER_ENDPOINT.to_string(),
            request_timeout_ms: millis(DEFAULT_REQUEST_TIMEOUT),
            pre_call_delay_ms: millis(DEFAULT_PRE_CALL_DELAY),
            post_success_delay_ms: millis(DEFAULT_POST_SUCCESS_DELAY),
            retry_delay_ms: millis(DEFAULT_RETRY_DELAY),
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            inter_subject_delay_ms: millis(DEFAULT_INTER_SUBJECT_DELAY),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            sampling_rate: DEFAULT_SAMPLING_RATE,
            step: DEFAULT_STEP_SIZE,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            box_selection: BoxSelection::default(),
            max_frame_dimension: DEFAULT_MAX_FRAME_DIMENSION,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facefind").join("settings.json"))
    }

    /// Reads `path` if given, otherwise the platform config file. Only a
    /// missing default file falls back to defaults; an explicit path must
    /// exist.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let json = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Json { path, source })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |field, reason: &str| {
            Err(SettingsError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if self.step < 1 {
            return invalid("step", "must be >= 1");
        }
        if !(self.sampling_rate > 0.0 && self.sampling_rate.is_finite()) {
            return invalid("sampling_rate", "must be a positive number");
        }
        if !(0.0..=PROVIDER_CONFIDENCE_SCALE).contains(&self.confidence_threshold) {
            return invalid("confidence_threshold", "must be between 0 and 100");
        }
        if !(self.backoff_factor >= 1.0 && self.backoff_factor.is_finite()) {
            return invalid("backoff_factor", "must be >= 1");
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return invalid("max_attempts", "must be between 1 and 20");
        }
        if !(self.dedup_window >= 0.0 && self.dedup_window.is_finite()) {
            return invalid("dedup_window", "must be a non-negative number");
        }
        if self.endpoint.trim().is_empty() {
            return invalid("endpoint", "must not be empty");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            pre_call_delay: Duration::from_millis(self.pre_call_delay_ms),
            post_success_delay: Duration::from_millis(self.post_success_delay_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            backoff_factor: self.backoff_factor,
            max_attempts: self.max_attempts,
        }
    }

    pub fn inter_subject_delay(&self) -> Duration {
        Duration::from_millis(self.inter_subject_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn max_frame_dimension(&self) -> Option<u32> {
        (self.max_frame_dimension > 0).then_some(self.max_frame_dimension)
    }
}
