use serde::{Deserialize, Serialize};

use crate::recognition::domain::match_candidate::MatchCandidate;
use crate::recognition::domain::subject::SubjectId;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::shared::timestamp::format_timestamp;

/// A subject seen at a point in the video. The unit of pipeline output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub timestamp: f64,
    pub timestamp_formatted: String,
    /// Provider score divided by the provider scale, in [0, 1].
    pub confidence: f64,
    pub frame: String,
    pub frame_index: usize,
    pub bounding_box: Option<BoundingBox>,
}

impl Detection {
    pub fn from_match(
        candidate: MatchCandidate,
        frame: &Frame,
        bounding_box: Option<BoundingBox>,
    ) -> Self {
        let confidence = candidate.normalized_confidence();
        Self {
            subject_id: candidate.subject_id,
            subject_name: candidate.subject_name,
            timestamp: frame.timestamp(),
            timestamp_formatted: format_timestamp(frame.timestamp()),
            confidence,
            frame: frame.name(),
            frame_index: frame.index(),
            bounding_box,
        }
    }
}
