use crate::recognition::domain::subject::{Subject, SubjectId};
use crate::shared::constants::PROVIDER_CONFIDENCE_SCALE;

/// A search hit above threshold, attributed to the subject whose gallery
/// produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCandidate {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub face_token: String,
    pub raw_confidence: f64,
}

impl MatchCandidate {
    pub fn for_subject(subject: &Subject, face_token: String, raw_confidence: f64) -> Self {
        Self {
            subject_id: subject.id.clone(),
            subject_name: subject.name.clone(),
            face_token,
            raw_confidence,
        }
    }

    pub fn normalized_confidence(&self) -> f64 {
        normalize_confidence(self.raw_confidence)
    }
}

/// Converts a raw provider score to [0, 1]. The single place this
/// conversion happens.
pub fn normalize_confidence(raw: f64) -> f64 {
    raw / PROVIDER_CONFIDENCE_SCALE
}
