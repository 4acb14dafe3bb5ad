use serde::{Deserialize, Serialize};

use crate::recognition::domain::provider_error::ProviderError;
use crate::shared::bounding_box::BoundingBox;

/// One face found by a detect call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub face_token: String,
    pub rectangle: BoundingBox,
    /// Provider-specific detection attributes, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
}

/// One result of searching an image against a gallery.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub face_token: String,
    /// Similarity on the provider's native 0-100 scale.
    pub confidence: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GalleryStatus {
    pub face_count: usize,
}

/// Port to a remote face recognition service organised around per-subject
/// galleries of enrolled faces.
///
/// Every call is a single network request; pacing and retries are the
/// caller's concern (see `ResilientExecutor`).
pub trait RecognitionProvider: Send {
    /// Creates an empty gallery and returns its token.
    fn create_gallery(&self, name: &str) -> Result<String, ProviderError>;

    fn enroll_face(&self, gallery_token: &str, face_token: &str) -> Result<(), ProviderError>;

    fn detect_faces(&self, image: &[u8]) -> Result<Vec<DetectedFace>, ProviderError>;

    fn search_gallery(
        &self,
        image: &[u8],
        gallery_token: &str,
    ) -> Result<Vec<SearchHit>, ProviderError>;

    /// Reports how many faces the gallery holds. An unknown gallery is an
    /// error classified as an invalid resource.
    fn validate_gallery(&self, gallery_token: &str) -> Result<GalleryStatus, ProviderError>;

    fn delete_gallery(&self, gallery_token: &str) -> Result<(), ProviderError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum ProviderCall {
        Create(String),
        Enroll { gallery: String, face: String },
        Detect,
        Search(String),
        Validate(String),
        Delete(String),
    }

    /// In-memory provider. Galleries map token to face count; detect and
    /// search answers are scripted per image.
    #[derive(Clone, Default)]
    pub struct FakeProvider {
        pub calls: Arc<Mutex<Vec<ProviderCall>>>,
        pub galleries: Arc<Mutex<HashMap<String, usize>>>,
        /// Faces for images without an entry in `faces`.
        pub default_faces: Vec<DetectedFace>,
        pub faces: HashMap<Vec<u8>, Vec<DetectedFace>>,
        pub hits: HashMap<(Vec<u8>, String), Vec<SearchHit>>,
        /// Errors returned by every call of the named kind.
        pub failing: HashMap<&'static str, ProviderError>,
    }

    pub fn face(token: &str, x: i32, y: i32) -> DetectedFace {
        DetectedFace {
            face_token: token.to_string(),
            rectangle: BoundingBox::new(x, y, 40, 40),
            attributes: None,
        }
    }

    pub fn hit(token: &str, confidence: f64) -> SearchHit {
        SearchHit {
            face_token: token.to_string(),
            confidence,
        }
    }

    pub fn rate_limited() -> ProviderError {
        ProviderError::Api {
            status: 403,
            message: "CONCURRENCY_LIMIT_EXCEEDED".into(),
        }
    }

    impl FakeProvider {
        pub fn with_gallery(self, token: &str, face_count: usize) -> Self {
            self.galleries
                .lock()
                .unwrap()
                .insert(token.to_string(), face_count);
            self
        }

        pub fn with_hits(mut self, image: &[u8], gallery: &str, hits: Vec<SearchHit>) -> Self {
            self.hits.insert((image.to_vec(), gallery.to_string()), hits);
            self
        }

        pub fn with_faces(mut self, image: &[u8], faces: Vec<DetectedFace>) -> Self {
            self.faces.insert(image.to_vec(), faces);
            self
        }

        pub fn failing(mut self, call: &'static str, error: ProviderError) -> Self {
            self.failing.insert(call, error);
            self
        }

        pub fn calls(&self) -> Vec<ProviderCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Gallery tokens searched, in call order.
        pub fn searches(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    ProviderCall::Search(g) => Some(g),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, pred: impl Fn(&ProviderCall) -> bool) -> usize {
            self.calls().iter().filter(|c| pred(c)).count()
        }

        fn record(&self, call: ProviderCall, kind: &str) -> Result<(), ProviderError> {
            self.calls.lock().unwrap().push(call);
            match self.failing.get(kind) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    impl RecognitionProvider for FakeProvider {
        fn create_gallery(&self, name: &str) -> Result<String, ProviderError> {
            self.record(ProviderCall::Create(name.to_string()), "create")?;
            let mut galleries = self.galleries.lock().unwrap();
            let token = format!("gallery-{}", galleries.len() + 1);
            galleries.insert(token.clone(), 0);
            Ok(token)
        }

        fn enroll_face(&self, gallery_token: &str, face_token: &str) -> Result<(), ProviderError> {
            self.record(
                ProviderCall::Enroll {
                    gallery: gallery_token.to_string(),
                    face: face_token.to_string(),
                },
                "enroll",
            )?;
            match self.galleries.lock().unwrap().get_mut(gallery_token) {
                Some(count) => {
                    *count += 1;
                    Ok(())
                }
                None => Err(ProviderError::GalleryNotFound(gallery_token.to_string())),
            }
        }

        fn detect_faces(&self, image: &[u8]) -> Result<Vec<DetectedFace>, ProviderError> {
            self.record(ProviderCall::Detect, "detect")?;
            Ok(self
                .faces
                .get(image)
                .cloned()
                .unwrap_or_else(|| self.default_faces.clone()))
        }

        fn search_gallery(
            &self,
            image: &[u8],
            gallery_token: &str,
        ) -> Result<Vec<SearchHit>, ProviderError> {
            self.record(ProviderCall::Search(gallery_token.to_string()), "search")?;
            Ok(self
                .hits
                .get(&(image.to_vec(), gallery_token.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        fn validate_gallery(&self, gallery_token: &str) -> Result<GalleryStatus, ProviderError> {
            self.record(ProviderCall::Validate(gallery_token.to_string()), "validate")?;
            match self.galleries.lock().unwrap().get(gallery_token) {
                Some(&face_count) => Ok(GalleryStatus { face_count }),
                None => Err(ProviderError::GalleryNotFound(gallery_token.to_string())),
            }
        }

        fn delete_gallery(&self, gallery_token: &str) -> Result<(), ProviderError> {
            self.record(ProviderCall::Delete(gallery_token.to_string()), "delete")?;
            match self.galleries.lock().unwrap().remove(gallery_token) {
                Some(_) => Ok(()),
                None => Err(ProviderError::GalleryNotFound(gallery_token.to_string())),
            }
        }
    }
}
