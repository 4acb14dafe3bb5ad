use thiserror::Error;

/// Failure reported by a recognition provider call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected provider response: {0}")]
    Decode(String),
    #[error("gallery not found: {0}")]
    GalleryNotFound(String),
}

impl ProviderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::GalleryNotFound(_) => ErrorClass::InvalidResource,
            other => ErrorClass::classify(&other.to_string()),
        }
    }
}

/// How a failed call should be treated by the request executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate, concurrency or QPS ceiling hit. Retry after backing off.
    TransientRate,
    /// The referenced gallery is unknown or malformed. Never retried.
    InvalidResource,
    /// Anything else (network hiccups, 5xx, decode failures). Retried.
    Other,
}

const INVALID_RESOURCE_MARKERS: &[&str] = &[
    "INVALID_FACESET_TOKEN",
    "FACESET_NOT_FOUND",
    "INVALID_OUTER_ID",
    "GALLERY NOT FOUND",
];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "CONCURRENCY_LIMIT",
    "RATE_LIMIT",
    "RATE LIMIT",
    "QPS",
    "TOO MANY REQUESTS",
];

impl ErrorClass {
    /// Classifies a provider error message by its wording.
    pub fn classify(message: &str) -> Self {
        let upper = message.to_ascii_uppercase();
        if INVALID_RESOURCE_MARKERS.iter().any(|m| upper.contains(m)) {
            ErrorClass::InvalidResource
        } else if RATE_LIMIT_MARKERS.iter().any(|m| upper.contains(m)) {
            ErrorClass::TransientRate
        } else {
            ErrorClass::Other
        }
    }

    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::InvalidResource)
    }
}
