pub mod bounding_box_resolver;
pub mod deduplicator;
pub mod detection;
pub mod match_candidate;
pub mod provider_error;
pub mod recognition_provider;
pub mod retry_policy;
pub mod subject;
