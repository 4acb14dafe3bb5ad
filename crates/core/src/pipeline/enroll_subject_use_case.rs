use thiserror::Error;

use crate::recognition::domain::recognition_provider::RecognitionProvider;
use crate::recognition::domain::subject::{Subject, SubjectId};
use crate::recognition::infrastructure::resilient_executor::{CallOutcome, ResilientExecutor};

#[derive(Error, Debug, PartialEq)]
pub enum EnrollError {
    #[error("at least one enrollment image is required")]
    NoImages,
    #[error("no face detected in enrollment image {image}")]
    NoFaceDetected { image: usize },
    #[error("{operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },
    #[error("gallery {0} reports no enrolled faces")]
    EmptyGallery(String),
}

fn required<T>(outcome: CallOutcome<T>, operation: &'static str) -> Result<T, EnrollError> {
    match outcome {
        CallOutcome::Success(value) => Ok(value),
        CallOutcome::InvalidResource(message) => Err(EnrollError::Provider { operation, message }),
        CallOutcome::Exhausted {
            attempts,
            last_error,
        } => Err(EnrollError::Provider {
            operation,
            message: format!("no result after {attempts} attempts: {last_error}"),
        }),
    }
}

/// Creates a subject whose gallery holds one face per enrollment image.
///
/// Every image must show a face before any gallery is created. Once the
/// gallery exists, any later failure deletes it again (best effort) so no
/// half-enrolled gallery is left behind.
pub struct EnrollSubjectUseCase {
    provider: Box<dyn RecognitionProvider>,
    executor: ResilientExecutor,
}

impl EnrollSubjectUseCase {
    pub fn new(provider: Box<dyn RecognitionProvider>, executor: ResilientExecutor) -> Self {
        Self { provider, executor }
    }

    pub fn execute(&mut self, name: &str, images: &[Vec<u8>]) -> Result<Subject, EnrollError> {
        if images.is_empty() {
            return Err(EnrollError::NoImages);
        }

        let face_tokens = self.detect_enrollment_faces(images)?;

        let id = SubjectId::generate();
        let gallery_token = self.create_gallery(&id)?;

        if let Err(err) = self.populate(&gallery_token, &face_tokens) {
            log::warn!("Enrollment of {name} failed, deleting gallery {gallery_token}");
            self.discard(&gallery_token);
            return Err(err);
        }

        log::info!(
            "Enrolled {name} with {} faces into gallery {gallery_token}",
            face_tokens.len()
        );
        Ok(Subject {
            id,
            name: name.to_string(),
            gallery_token,
            face_tokens,
        })
    }

    /// First detected face token of each image, in image order.
    fn detect_enrollment_faces(&mut self, images: &[Vec<u8>]) -> Result<Vec<String>, EnrollError> {
        let provider = self.provider.as_ref();
        let mut tokens = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            let faces = required(
                self.executor
                    .execute("detect enrollment face", || provider.detect_faces(image)),
                "detect",
            )?;
            let face = faces
                .into_iter()
                .next()
                .ok_or(EnrollError::NoFaceDetected { image: i + 1 })?;
            tokens.push(face.face_token);
        }
        Ok(tokens)
    }

    fn create_gallery(&mut self, id: &SubjectId) -> Result<String, EnrollError> {
        let provider = self.provider.as_ref();
        required(
            self.executor
                .execute("create gallery", || provider.create_gallery(id.as_str())),
            "create gallery",
        )
    }

    fn discard(&mut self, gallery_token: &str) {
        let provider = self.provider.as_ref();
        let _ = self
            .executor
            .execute("delete gallery", || provider.delete_gallery(gallery_token));
    }

    fn populate(&mut self, gallery_token: &str, face_tokens: &[String]) -> Result<(), EnrollError> {
        let provider = self.provider.as_ref();
        for face_token in face_tokens {
            required(
                self.executor
                    .execute("enroll face", || provider.enroll_face(gallery_token, face_token)),
                "enroll face",
            )?;
        }

        let status = required(
            self.executor
                .execute("validate gallery", || provider.validate_gallery(gallery_token)),
            "validate gallery",
        )?;
        if status.face_count == 0 {
            return Err(EnrollError::EmptyGallery(gallery_token.to_string()));
        }
        Ok(())
    }
}
