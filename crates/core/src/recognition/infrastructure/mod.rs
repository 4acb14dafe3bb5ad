pub mod facepp_provider;
pub mod json_subject_store;
pub mod resilient_executor;
pub mod sleeper;
