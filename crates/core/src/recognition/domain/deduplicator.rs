use crate::recognition::domain::detection::Detection;
use crate::shared::constants::DEFAULT_DEDUP_WINDOW;

/// Collapses repeated sightings of a subject within a time window.
pub struct Deduplicator {
    window: f64,
}

impl Deduplicator {
    pub fn new(window: f64) -> Self {
        Self { window }
    }

    /// Sorts by (subject id, timestamp) and greedily keeps a detection when
    /// its subject differs from the last kept one, or when it is more than
    /// `window` seconds after the last *kept* detection of that subject.
    ///
    /// Dropped detections never become the reference point: with a 5s window,
    /// sightings at 0, 3 and 7 keep 0 and 7.
    pub fn apply(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        detections.sort_by(|a, b| {
            a.subject_id
                .as_str()
                .cmp(b.subject_id.as_str())
                .then(a.timestamp.total_cmp(&b.timestamp))
        });

        let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
        for detection in detections {
            let keep = match kept.last() {
                None => true,
                Some(last) => {
                    last.subject_id != detection.subject_id
                        || detection.timestamp - last.timestamp > self.window
                }
            };
            if keep {
                kept.push(detection);
            }
        }
        kept
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW)
    }
}
