use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::recognition::domain::subject::{Subject, SubjectId};

#[derive(Error, Debug)]
pub enum SubjectStoreError {
    #[error("failed to access subject store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("subject store {path} is corrupt: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not determine data directory")]
    NoDataDir,
}

/// Enrolled subjects persisted as a pretty-printed JSON array.
///
/// A missing file reads as an empty store.
pub struct JsonSubjectStore {
    path: PathBuf,
}

impl JsonSubjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory, e.g.
    /// `~/.local/share/facefind/subjects.json` on Linux.
    pub fn open_default() -> Result<Self, SubjectStoreError> {
        dirs::data_dir()
            .map(|d| Self::new(d.join("facefind").join("subjects.json")))
            .ok_or(SubjectStoreError::NoDataDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Subject>, SubjectStoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        serde_json::from_str(&json).map_err(|source| SubjectStoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(&self, subjects: &[Subject]) -> Result<(), SubjectStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(subjects).map_err(|source| {
            SubjectStoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(|source| self.io_error(source))
    }

    /// Inserts or replaces the subject with the same id, keeping enrollment
    /// order for existing entries.
    pub fn upsert(&self, subject: Subject) -> Result<(), SubjectStoreError> {
        let mut subjects = self.load()?;
        match subjects.iter_mut().find(|s| s.id == subject.id) {
            Some(existing) => *existing = subject,
            None => subjects.push(subject),
        }
        self.save(&subjects)
    }

    pub fn remove(&self, id: &SubjectId) -> Result<Option<Subject>, SubjectStoreError> {
        let mut subjects = self.load()?;
        let Some(pos) = subjects.iter().position(|s| &s.id == id) else {
            return Ok(None);
        };
        let removed = subjects.remove(pos);
        self.save(&subjects)?;
        Ok(Some(removed))
    }

    fn io_error(&self, source: std::io::Error) -> SubjectStoreError {
        SubjectStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn subject(id: &str, name: &str) -> Subject {
        Subject {
            id: SubjectId::new(id),
            name: name.into(),
            gallery_token: format!("gallery-{id}"),
            face_tokens: vec![format!("face-{id}")],
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSubjectStore::new(tmp.path().join("subjects.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_loads_back() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSubjectStore::new(tmp.path().join("nested").join("subjects.json"));
        let subjects = vec![subject("a", "Alice"), subject("b", "Bob")];

        store.save(&subjects).unwrap();

        assert_eq!(store.load().unwrap(), subjects);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSubjectStore::new(tmp.path().join("subjects.json"));
        store.upsert(subject("a", "Alice")).unwrap();
        store.upsert(subject("b", "Bob")).unwrap();
        store.upsert(subject("a", "Alicia")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Alicia");
        assert_eq!(loaded[1].name, "Bob");
    }

    #[test]
    fn test_remove_returns_removed_subject() {
        let tmp = TempDir::new().unwrap();
        let store = JsonSubjectStore::new(tmp.path().join("subjects.json"));
        store.save(&[subject("a", "Alice"), subject("b", "Bob")]).unwrap();

        let removed = store.remove(&SubjectId::new("a")).unwrap();

        assert_eq!(removed.map(|s| s.name), Some("Alice".to_string()));
        assert_eq!(store.load().unwrap().len(), 1);
        assert!(store.remove(&SubjectId::new("zzz")).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("subjects.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonSubjectStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SubjectStoreError::Json { .. }));
    }

    #[test]
    fn test_default_store_lives_under_facefind() {
        if let Ok(store) = JsonSubjectStore::open_default() {
            assert!(store.path().to_string_lossy().contains("facefind"));
        }
    }
}
