use serde::{Deserialize, Serialize};

use crate::recognition::domain::recognition_provider::DetectedFace;
use crate::shared::bounding_box::BoundingBox;

/// Which detected rectangle, if any, to attach to an accepted match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxSelection {
    /// First rectangle of the frame's detect result, for every match in
    /// that frame. Detect and search results share no guaranteed order, so
    /// with several faces in frame this may point at the wrong person.
    #[default]
    FirstFace,
    /// Never attach a box.
    Omit,
}

/// Attaches a location to matches using the frame's detect result.
///
/// Does not correlate search face tokens with detected rectangles.
pub struct BoundingBoxResolver {
    selection: BoxSelection,
}

impl BoundingBoxResolver {
    pub fn new(selection: BoxSelection) -> Self {
        Self { selection }
    }

    /// Returns `None` when the frame had no detected faces; a box is never
    /// synthesized.
    pub fn resolve(&self, faces: &[DetectedFace]) -> Option<BoundingBox> {
        match self.selection {
            BoxSelection::FirstFace => faces.first().map(|face| face.rectangle),
            BoxSelection::Omit => None,
        }
    }
}

impl Default for BoundingBoxResolver {
    fn default() -> Self {
        Self::new(BoxSelection::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(token: &str, x: i32) -> DetectedFace {
        DetectedFace {
            face_token: token.into(),
            rectangle: BoundingBox::new(x, 10, 40, 40),
            attributes: None,
        }
    }

    #[test]
    fn test_first_face_picks_first_rectangle() {
        let resolver = BoundingBoxResolver::default();
        let faces = vec![face("a", 5), face("b", 200)];
        assert_eq!(resolver.resolve(&faces), Some(BoundingBox::new(5, 10, 40, 40)));
    }

    #[test]
    fn test_first_face_is_used_even_when_another_face_matched() {
        // The search hit may belong to the second face; the policy still pins
        // the first rectangle.
        let resolver = BoundingBoxResolver::new(BoxSelection::FirstFace);
        let faces = vec![face("other", 0), face("matched", 300)];
        assert_eq!(resolver.resolve(&faces).map(|b| b.x), Some(0));
    }

    #[test]
    fn test_no_faces_gives_no_box() {
        let resolver = BoundingBoxResolver::default();
        assert_eq!(resolver.resolve(&[]), None);
    }

    #[test]
    fn test_omit_never_attaches() {
        let resolver = BoundingBoxResolver::new(BoxSelection::Omit);
        assert_eq!(resolver.resolve(&[face("a", 5)]), None);
    }

    #[test]
    fn test_selection_deserializes_from_snake_case() {
        let sel: BoxSelection = serde_json::from_str("\"first_face\"").unwrap();
        assert_eq!(sel, BoxSelection::FirstFace);
        let sel: BoxSelection = serde_json::from_str("\"omit\"").unwrap();
        assert_eq!(sel, BoxSelection::Omit);
    }
}
