use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable identity of an enrolled subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An enrolled identity and its handle into the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub gallery_token: String,
    /// One token per enrollment image.
    pub face_tokens: Vec<String>,
}

impl Subject {
    /// A subject without a gallery or without enrolled faces must never be
    /// searched.
    pub fn is_searchable(&self) -> bool {
        !self.gallery_token.is_empty() && !self.face_tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(gallery: &str, faces: &[&str]) -> Subject {
        Subject {
            id: SubjectId::new("s1"),
            name: "Ada".into(),
            gallery_token: gallery.into(),
            face_tokens: faces.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_searchable_with_gallery_and_faces() {
        assert!(subject("g1", &["f1"]).is_searchable());
    }

    #[test]
    fn test_empty_face_tokens_not_searchable() {
        assert!(!subject("g1", &[]).is_searchable());
    }

    #[test]
    fn test_empty_gallery_not_searchable() {
        assert!(!subject("", &["f1"]).is_searchable());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(SubjectId::generate(), SubjectId::generate());
    }

    #[test]
    fn test_json_uses_camel_case_and_plain_id() {
        let json = serde_json::to_value(subject("g1", &["f1"])).unwrap();
        assert_eq!(json["id"], "s1");
        assert_eq!(json["galleryToken"], "g1");
        assert_eq!(json["faceTokens"][0], "f1");
    }
}
