use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use facefind_core::pipeline::enroll_subject_use_case::EnrollSubjectUseCase;
use facefind_core::pipeline::pipeline_logger::LogPipelineLogger;
use facefind_core::pipeline::process_video_use_case::{ProcessVideoConfig, ProcessVideoUseCase};
use facefind_core::pipeline::remove_subject_use_case::RemoveSubjectUseCase;
use facefind_core::recognition::domain::detection::Detection;
use facefind_core::recognition::domain::subject::Subject;
use facefind_core::recognition::infrastructure::facepp_provider::{
    FacePlusPlusConfig, FacePlusPlusProvider,
};
use facefind_core::recognition::infrastructure::json_subject_store::JsonSubjectStore;
use facefind_core::recognition::infrastructure::resilient_executor::ResilientExecutor;
use facefind_core::shared::constants::VIDEO_EXTENSIONS;
use facefind_core::shared::settings::Settings;
use facefind_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;

/// Find enrolled people in videos using a remote face recognition service.
#[derive(Parser)]
#[command(name = "facefind")]
struct Cli {
    /// Settings file (default: <config dir>/facefind/settings.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subject store (default: <data dir>/facefind/subjects.json).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Credentials {
    /// Provider API key.
    #[arg(long, env = "FACEFIND_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Provider API secret.
    #[arg(long, env = "FACEFIND_API_SECRET", hide_env_values = true)]
    api_secret: String,
}

#[derive(Subcommand)]
enum Command {
    /// Enroll a subject from one or more photos, one face per photo.
    Enroll {
        /// Display name of the subject.
        name: String,

        /// Photos of the subject.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Remove a subject and delete its gallery.
    Remove {
        /// Subject id or exact name.
        subject: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// List enrolled subjects.
    List,

    /// Search a video for enrolled subjects and print detections as JSON.
    Scan {
        /// Input video file.
        video: PathBuf,

        /// Write detections to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Only search these subjects, by id or name (comma-separated).
        #[arg(long, value_delimiter = ',')]
        subjects: Option<Vec<String>>,

        /// Frames per second extracted from the video.
        #[arg(long)]
        sampling_rate: Option<f64>,

        /// Search every Nth extracted frame.
        #[arg(long)]
        step: Option<usize>,

        /// Minimum provider confidence (0-100) for a match.
        #[arg(long)]
        threshold: Option<f64>,

        /// Seconds within which repeated sightings of a subject collapse.
        #[arg(long)]
        dedup_window: Option<f64>,

        #[command(flatten)]
        credentials: Credentials,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    let store = match cli.store {
        Some(path) => JsonSubjectStore::new(path),
        None => JsonSubjectStore::open_default()?,
    };

    match cli.command {
        Command::Enroll {
            name,
            images,
            credentials,
        } => run_enroll(&settings, &store, &credentials, &name, &images),
        Command::Remove {
            subject,
            credentials,
        } => run_remove(&settings, &store, &credentials, &subject),
        Command::List => run_list(&store),
        Command::Scan {
            video,
            output,
            subjects,
            sampling_rate,
            step,
            threshold,
            dedup_window,
            credentials,
        } => {
            apply_overrides(&mut settings, sampling_rate, step, threshold, dedup_window);
            validate_scan(&video, &settings)?;
            run_scan(
                &settings,
                &store,
                &credentials,
                &video,
                output.as_deref(),
                subjects.as_deref(),
            )
        }
    }
}

fn run_enroll(
    settings: &Settings,
    store: &JsonSubjectStore,
    credentials: &Credentials,
    name: &str,
    images: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    if name.trim().is_empty() {
        return Err("Subject name must not be empty".into());
    }
    let mut photos = Vec::with_capacity(images.len());
    for path in images {
        let bytes = fs::read(path)
            .map_err(|e| format!("Failed to read image {}: {e}", path.display()))?;
        photos.push(bytes);
    }

    let provider = build_provider(settings, credentials)?;
    let mut use_case =
        EnrollSubjectUseCase::new(Box::new(provider), ResilientExecutor::new(settings.retry_policy()));
    let subject = use_case.execute(name, &photos)?;

    store.upsert(subject.clone())?;
    log::info!("Saved subject to {}", store.path().display());
    println!("{}\t{}", subject.id, subject.name);
    Ok(())
}

fn run_remove(
    settings: &Settings,
    store: &JsonSubjectStore,
    credentials: &Credentials,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subjects = store.load()?;
    let subject = find_subject(&subjects, key)?;

    let provider = build_provider(settings, credentials)?;
    let mut use_case =
        RemoveSubjectUseCase::new(Box::new(provider), ResilientExecutor::new(settings.retry_policy()));
    if !use_case.execute(subject) {
        log::warn!("Gallery of {} was not deleted by the provider", subject.name);
    }

    store.remove(&subject.id)?;
    println!("Removed {} ({})", subject.name, subject.id);
    Ok(())
}

fn run_list(store: &JsonSubjectStore) -> Result<(), Box<dyn std::error::Error>> {
    let subjects = store.load()?;
    if subjects.is_empty() {
        eprintln!("No subjects enrolled ({})", store.path().display());
    }
    for subject in &subjects {
        println!(
            "{}\t{}\t{} faces",
            subject.id,
            subject.name,
            subject.face_tokens.len()
        );
    }
    Ok(())
}

fn run_scan(
    settings: &Settings,
    store: &JsonSubjectStore,
    credentials: &Credentials,
    video: &Path,
    output: Option<&Path>,
    filter: Option<&[String]>,
) -> Result<(), Box<dyn std::error::Error>> {
    let subjects = select_subjects(store.load()?, filter)?;
    let config = ProcessVideoConfig::from_settings(settings)?;
    let provider = build_provider(settings, credentials)?;

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rSearching frame {current}/{total}");
        true
    });

    let mut use_case = ProcessVideoUseCase::new(
        Box::new(FfmpegFrameSource::new(settings.max_frame_dimension())),
        Box::new(provider),
        ResilientExecutor::new(settings.retry_policy()),
        config,
        Box::new(LogPipelineLogger::default()),
        Some(progress),
    );
    let detections = use_case.execute(video, &subjects, settings.sampling_rate)?;
    eprintln!();

    for detection in &detections {
        log::info!("{}", describe(detection));
    }

    let json = serde_json::to_string_pretty(&detections)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!(
                "{} detections written to {}",
                detections.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn build_provider(
    settings: &Settings,
    credentials: &Credentials,
) -> Result<FacePlusPlusProvider, Box<dyn std::error::Error>> {
    if credentials.api_key.is_empty() || credentials.api_secret.is_empty() {
        return Err("API key and secret must not be empty".into());
    }
    let config = FacePlusPlusConfig {
        endpoint: settings.endpoint.clone(),
        timeout: settings.request_timeout(),
        ..FacePlusPlusConfig::new(&credentials.api_key, &credentials.api_secret)
    };
    Ok(FacePlusPlusProvider::new(config)?)
}

fn apply_overrides(
    settings: &mut Settings,
    sampling_rate: Option<f64>,
    step: Option<usize>,
    threshold: Option<f64>,
    dedup_window: Option<f64>,
) {
    if let Some(rate) = sampling_rate {
        settings.sampling_rate = rate;
    }
    if let Some(step) = step {
        settings.step = step;
    }
    if let Some(threshold) = threshold {
        settings.confidence_threshold = threshold;
    }
    if let Some(window) = dedup_window {
        settings.dedup_window = window;
    }
}

fn validate_scan(video: &Path, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !video.exists() {
        return Err(format!("Input file not found: {}", video.display()).into());
    }
    if !is_video(video) {
        log::warn!(
            "{} does not have a known video extension ({})",
            video.display(),
            VIDEO_EXTENSIONS.join(", ")
        );
    }
    settings.validate()?;
    Ok(())
}

/// Subjects matching `filter` by id or name, in store order. `None` selects
/// every subject.
fn select_subjects(
    subjects: Vec<Subject>,
    filter: Option<&[String]>,
) -> Result<Vec<Subject>, Box<dyn std::error::Error>> {
    if subjects.is_empty() {
        return Err("No subjects enrolled; run `facefind enroll` first".into());
    }
    let Some(keys) = filter else {
        return Ok(subjects);
    };

    for key in keys {
        find_subject(&subjects, key)?;
    }
    Ok(subjects
        .into_iter()
        .filter(|s| keys.iter().any(|k| s.id.as_str() == k || s.name == *k))
        .collect())
}

fn find_subject<'a>(
    subjects: &'a [Subject],
    key: &str,
) -> Result<&'a Subject, Box<dyn std::error::Error>> {
    if let Some(subject) = subjects.iter().find(|s| s.id.as_str() == key) {
        return Ok(subject);
    }
    let mut by_name = subjects.iter().filter(|s| s.name == key);
    match (by_name.next(), by_name.next()) {
        (Some(subject), None) => Ok(subject),
        (Some(_), Some(_)) => {
            Err(format!("Several subjects are named '{key}'; use the subject id").into())
        }
        (None, _) => Err(format!("Unknown subject '{key}'").into()),
    }
}

fn describe(detection: &Detection) -> String {
    format!(
        "Found {} at {} (confidence {:.1}%)",
        detection.subject_name,
        detection.timestamp_formatted,
        detection.confidence * 100.0
    )
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
