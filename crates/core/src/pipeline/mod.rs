pub mod enroll_subject_use_case;
pub mod pipeline_logger;
pub mod process_video_use_case;
pub mod remove_subject_use_case;
pub mod search_orchestrator;
