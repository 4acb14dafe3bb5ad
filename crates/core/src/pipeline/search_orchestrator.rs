use std::time::Duration;

use crate::recognition::domain::match_candidate::MatchCandidate;
use crate::recognition::domain::recognition_provider::RecognitionProvider;
use crate::recognition::domain::subject::Subject;
use crate::recognition::infrastructure::resilient_executor::{CallOutcome, ResilientExecutor};
use crate::shared::constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INTER_SUBJECT_DELAY};

/// Searches one frame against each subject's gallery in turn.
///
/// Galleries are validated on every frame and searched one subject per
/// provider call, in the order subjects were given. Results from different
/// galleries are never batched together.
pub struct SearchOrchestrator {
    confidence_threshold: f64,
    inter_subject_delay: Duration,
}

impl SearchOrchestrator {
    pub fn new(confidence_threshold: f64, inter_subject_delay: Duration) -> Self {
        Self {
            confidence_threshold,
            inter_subject_delay,
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Matches above threshold for `image`, tagged with their subject.
    ///
    /// Subjects whose gallery cannot be confirmed are left out of this frame
    /// only. Returns empty without searching when no gallery validates.
    pub fn search_frame(
        &self,
        executor: &mut ResilientExecutor,
        provider: &dyn RecognitionProvider,
        image: &[u8],
        subjects: &[Subject],
    ) -> Vec<MatchCandidate> {
        let mut valid = Vec::with_capacity(subjects.len());
        for subject in subjects.iter().filter(|s| s.is_searchable()) {
            if self.validate(executor, provider, subject) {
                valid.push(subject);
            }
        }

        if valid.is_empty() {
            log::debug!("No valid galleries for this frame, skipping search");
            return Vec::new();
        }

        let mut matches = Vec::new();
        for (i, subject) in valid.into_iter().enumerate() {
            if i > 0 {
                executor.pause(self.inter_subject_delay);
            }

            let outcome = executor.execute(&format!("search {}", subject.name), || {
                provider.search_gallery(image, &subject.gallery_token)
            });
            let Some(hits) = outcome.into_result() else {
                continue;
            };

            matches.extend(
                hits.into_iter()
                    .filter(|hit| hit.confidence > self.confidence_threshold)
                    .map(|hit| MatchCandidate::for_subject(subject, hit.face_token, hit.confidence)),
            );
        }
        matches
    }

    fn validate(
        &self,
        executor: &mut ResilientExecutor,
        provider: &dyn RecognitionProvider,
        subject: &Subject,
    ) -> bool {
        let outcome = executor.execute(&format!("validate {}", subject.name), || {
            provider.validate_gallery(&subject.gallery_token)
        });
        match outcome {
            CallOutcome::Success(status) if status.face_count > 0 => true,
            CallOutcome::Success(_) => {
                log::warn!("Gallery for {} has no enrolled faces, skipping", subject.name);
                false
            }
            CallOutcome::InvalidResource(message) => {
                log::warn!("Gallery for {} is invalid, skipping: {message}", subject.name);
                false
            }
            CallOutcome::Exhausted { .. } => {
                log::warn!("Could not validate gallery for {}, skipping", subject.name);
                false
            }
        }
    }
}

impl Default for SearchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INTER_SUBJECT_DELAY)
    }
}
