use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::search_orchestrator::SearchOrchestrator;
use crate::recognition::domain::bounding_box_resolver::BoundingBoxResolver;
use crate::recognition::domain::deduplicator::Deduplicator;
use crate::recognition::domain::detection::Detection;
use crate::recognition::domain::recognition_provider::{DetectedFace, RecognitionProvider};
use crate::recognition::domain::subject::Subject;
use crate::recognition::infrastructure::resilient_executor::{CallOutcome, ResilientExecutor};
use crate::shared::frame::Frame;
use crate::shared::settings::{Settings, SettingsError};
use crate::video::domain::frame_sampler::FrameSampler;
use crate::video::domain::frame_source::{FrameSource, FrameSourceError};

#[derive(Error, Debug)]
pub enum ProcessVideoError {
    #[error("video not found: {0}")]
    VideoNotFound(PathBuf),
    #[error("no subject has a usable gallery")]
    NoSearchableSubjects,
    #[error("frame extraction failed: {0}")]
    FrameExtraction(#[from] FrameSourceError),
    #[error("cancelled after {searched} of {total} frames")]
    Cancelled { searched: usize, total: usize },
}

/// The per-run pieces of the pipeline that only depend on settings.
#[derive(Default)]
pub struct ProcessVideoConfig {
    pub sampler: FrameSampler,
    pub orchestrator: SearchOrchestrator,
    pub resolver: BoundingBoxResolver,
    pub deduplicator: Deduplicator,
}

impl ProcessVideoConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let sampler = FrameSampler::new(settings.step).map_err(|reason| SettingsError::Invalid {
            field: "step",
            reason: reason.to_string(),
        })?;
        Ok(Self {
            sampler,
            orchestrator: SearchOrchestrator::new(
                settings.confidence_threshold,
                settings.inter_subject_delay(),
            ),
            resolver: BoundingBoxResolver::new(settings.box_selection),
            deduplicator: Deduplicator::new(settings.dedup_window),
        })
    }
}

/// Finds where each subject appears in a video.
///
/// Extracts every frame first, then walks the sampled frames one at a time:
/// detect faces, search each subject's gallery, attach a box to accepted
/// matches. Provider failures along the way cost at most one frame's results.
/// The progress callback runs between frames; returning `false` abandons
/// the rest of the video.
pub struct ProcessVideoUseCase {
    frame_source: Box<dyn FrameSource>,
    provider: Box<dyn RecognitionProvider>,
    executor: ResilientExecutor,
    config: ProcessVideoConfig,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
}

impl ProcessVideoUseCase {
    pub fn new(
        frame_source: Box<dyn FrameSource>,
        provider: Box<dyn RecognitionProvider>,
        executor: ResilientExecutor,
        config: ProcessVideoConfig,
        logger: Box<dyn PipelineLogger>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> Self {
        Self {
            frame_source,
            provider,
            executor,
            config,
            logger,
            on_progress,
        }
    }

    pub fn executor(&self) -> &ResilientExecutor {
        &self.executor
    }

    pub fn execute(
        &mut self,
        video: &Path,
        subjects: &[Subject],
        sampling_rate: f64,
    ) -> Result<Vec<Detection>, ProcessVideoError> {
        if !video.exists() {
            return Err(ProcessVideoError::VideoNotFound(video.to_path_buf()));
        }
        let searchable = subjects.iter().filter(|s| s.is_searchable()).count();
        if searchable == 0 {
            return Err(ProcessVideoError::NoSearchableSubjects);
        }

        let start = Instant::now();
        let frames = self.frame_source.extract(video, sampling_rate)?;
        self.logger
            .timing("extract", start.elapsed().as_secs_f64() * 1000.0);

        let total = self.config.sampler.selected_count(frames.len());
        let selected: Vec<&Frame> = self.config.sampler.select(&frames).collect();
        self.logger.info(&format!(
            "Searching {total} of {} frames for {searchable} subjects",
            frames.len()
        ));

        let mut detections = Vec::new();
        for (i, frame) in selected.into_iter().enumerate() {
            detections.extend(self.process_frame(frame, subjects));

            let searched = i + 1;
            self.logger.progress(searched, total);
            if let Some(ref cb) = self.on_progress {
                if !cb(searched, total) {
                    self.logger.summary();
                    return Err(ProcessVideoError::Cancelled { searched, total });
                }
            }
        }

        let raw = detections.len();
        let detections = self.config.deduplicator.apply(detections);
        let stats = self.executor.stats();
        self.logger.info(&format!(
            "{} detections ({raw} before deduplication); {} provider calls, {} retries, {} invalid, {} exhausted",
            detections.len(),
            stats.calls,
            stats.retries,
            stats.invalid,
            stats.exhausted
        ));
        self.logger.summary();

        Ok(detections)
    }

    fn process_frame(&mut self, frame: &Frame, subjects: &[Subject]) -> Vec<Detection> {
        let faces = self.detect(frame);

        let start = Instant::now();
        let candidates = self.config.orchestrator.search_frame(
            &mut self.executor,
            self.provider.as_ref(),
            frame.image(),
            subjects,
        );
        self.logger
            .timing("search", start.elapsed().as_secs_f64() * 1000.0);
        self.logger.count("matches", candidates.len());

        let bounding_box = self.config.resolver.resolve(&faces);
        candidates
            .into_iter()
            .map(|candidate| {
                log::debug!(
                    "{}: {} matched face {} ({:.1})",
                    frame.name(),
                    candidate.subject_name,
                    candidate.face_token,
                    candidate.raw_confidence
                );
                Detection::from_match(candidate, frame, bounding_box)
            })
            .collect()
    }

    /// Faces in `frame`. A failed detect counts as no faces; the frame is
    /// still searched and its matches carry no box.
    fn detect(&mut self, frame: &Frame) -> Vec<DetectedFace> {
        let start = Instant::now();
        let provider = self.provider.as_ref();
        let outcome = self
            .executor
            .execute(&format!("detect {}", frame.name()), || {
                provider.detect_faces(frame.image())
            });
        self.logger
            .timing("detect", start.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            CallOutcome::Success(faces) => {
                if faces.is_empty() {
                    log::debug!("{}: no faces detected", frame.name());
                    self.logger.count("frames_without_faces", 1);
                }
                faces
            }
            CallOutcome::InvalidResource(_) | CallOutcome::Exhausted { .. } => {
                self.logger.count("detect_failures", 1);
                Vec::new()
            }
        }
    }
}
