use crate::recognition::domain::recognition_provider::RecognitionProvider;
use crate::recognition::domain::subject::Subject;
use crate::recognition::infrastructure::resilient_executor::{CallOutcome, ResilientExecutor};

/// Deletes a subject's gallery. Best effort: provider failures are logged
/// and never returned, so a subject can always be removed locally.
pub struct RemoveSubjectUseCase {
    provider: Box<dyn RecognitionProvider>,
    executor: ResilientExecutor,
}

impl RemoveSubjectUseCase {
    pub fn new(provider: Box<dyn RecognitionProvider>, executor: ResilientExecutor) -> Self {
        Self { provider, executor }
    }

    /// Returns whether the provider confirmed the deletion.
    pub fn execute(&mut self, subject: &Subject) -> bool {
        if subject.gallery_token.is_empty() {
            return false;
        }

        let provider = self.provider.as_ref();
        let outcome = self.executor.execute("delete gallery", || {
            provider.delete_gallery(&subject.gallery_token)
        });
        match outcome {
            CallOutcome::Success(()) => {
                log::info!("Deleted gallery {} for {}", subject.gallery_token, subject.name);
                true
            }
            CallOutcome::InvalidResource(message) => {
                log::warn!("Gallery for {} was already gone: {message}", subject.name);
                false
            }
            CallOutcome::Exhausted { last_error, .. } => {
                log::warn!(
                    "Could not delete gallery {} for {}: {last_error}",
                    subject.gallery_token,
                    subject.name
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::recognition_provider::testing::{
        rate_limited, FakeProvider, ProviderCall,
    };
    use crate::recognition::domain::retry_policy::RetryPolicy;
    use crate::recognition::domain::subject::SubjectId;
    use crate::recognition::infrastructure::sleeper::testing::RecordingSleeper;

    fn use_case(provider: &FakeProvider) -> RemoveSubjectUseCase {
        RemoveSubjectUseCase::new(
            Box::new(provider.clone()),
            ResilientExecutor::with_sleeper(
                RetryPolicy::default().without_delays(),
                Box::new(RecordingSleeper::default()),
            ),
        )
    }

    fn subject(gallery: &str) -> Subject {
        Subject {
            id: SubjectId::new("s1"),
            name: "Ada".into(),
            gallery_token: gallery.into(),
            face_tokens: vec!["f".into()],
        }
    }

    #[test]
    fn test_deletes_gallery() {
        let provider = FakeProvider::default().with_gallery("g1", 1);
        assert!(use_case(&provider).execute(&subject("g1")));
        assert!(provider.galleries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_gallery_is_swallowed() {
        let provider = FakeProvider::default();
        assert!(!use_case(&provider).execute(&subject("g1")));
        assert_eq!(provider.calls(), vec![ProviderCall::Delete("g1".into())]);
    }

    #[test]
    fn test_transient_failure_is_swallowed() {
        let provider = FakeProvider::default()
            .with_gallery("g1", 1)
            .failing("delete", rate_limited());
        assert!(!use_case(&provider).execute(&subject("g1")));
        assert_eq!(provider.count(|c| matches!(c, ProviderCall::Delete(_))), 3);
    }

    #[test]
    fn test_subject_without_gallery_makes_no_call() {
        let provider = FakeProvider::default();
        assert!(!use_case(&provider).execute(&subject("")));
        assert!(provider.calls().is_empty());
    }
}
