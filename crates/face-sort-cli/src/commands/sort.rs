//! Sort command - classify photos and write the sorted archive.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use face_sort_adapters::{FsImageSource, ModelStore, ZipArchiveEncoder};
use face_sort_core::inference::{CandleGenderAnalyzer, DEFAULT_MIN_FACE_CONFIDENCE};
use face_sort_core::{
    validate_batch, BucketCounts, GenderClassifier, ImageClassifier, ImageItem, ImageSource, Session,
    SessionError, ARCHIVE_FILE_NAME, DEFAULT_CONFIDENCE_THRESHOLD,
};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{ProgressBar, SortSummary, SummaryFormat};

#[allow(clippy::trivially_copy_pass_by_ref)]
fn in_unit_range(value: &f32) -> bool {
    (0.0..=1.0).contains(value)
}

/// Parse and validate a threshold value (0.0-1.0).
fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if in_unit_range(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Shared arguments for sorting.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SortArgs {
    /// Photos or directories to sort
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Archive path, or a directory to write sorted_images.zip into
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Gender confidence below which a photo is unsorted (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f32>,

    /// Minimum face detection score (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub min_face_confidence: Option<f32>,

    /// Run inference on a GPU when one is available
    #[arg(long)]
    pub gpu: bool,

    /// Summary format
    #[arg(long, value_enum)]
    pub format: Option<SummaryFormat>,

    /// Pretty-print the JSON summary (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

impl SortArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest): hardcoded defaults (in the
    /// accessors), config files, CLI arguments.
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }
        if !args.gpu {
            args.gpu = config.classifier.gpu.unwrap_or(false);
        }

        // Out-of-range config values were already reported by `AppConfig::load`.
        args.threshold = args
            .threshold
            .or(config.classifier.threshold.filter(in_unit_range));
        args.min_face_confidence = args
            .min_face_confidence
            .or(config.classifier.min_face_confidence.filter(in_unit_range));

        if args.output.is_none() {
            args.output.clone_from(&config.output.path);
        }
        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_deref()
                .and_then(SummaryFormat::from_config);
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        args
    }

    /// Confidence threshold with fallback to the default.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold.unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    /// Face score floor with fallback to the default.
    #[must_use]
    pub fn min_face_confidence(&self) -> f32 {
        self.min_face_confidence
            .unwrap_or(DEFAULT_MIN_FACE_CONFIDENCE)
    }

    /// Summary format with fallback to text.
    #[must_use]
    pub fn format(&self) -> SummaryFormat {
        self.format.unwrap_or_default()
    }

    /// Where the archive is written.
    ///
    /// An existing directory gets `sorted_images.zip` inside it.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        match &self.output {
            Some(path) if path.is_dir() => path.join(ARCHIVE_FILE_NAME),
            Some(path) => path.clone(),
            None => PathBuf::from(ARCHIVE_FILE_NAME),
        }
    }

    fn model_store(&self) -> ModelStore {
        self.models_dir
            .as_ref()
            .map_or_else(ModelStore::at_default_location, ModelStore::new)
    }
}

/// Run the sort command, returning `Unsorted` when any photo could not be
/// placed in a group.
///
/// Expects `args` to have been processed through `with_config()` first.
///
/// # Errors
///
/// Returns an error if the batch has no images, the models cannot be
/// loaded, or the archive cannot be built or written.
pub fn run(args: &SortArgs) -> Result<ExitCode> {
    info!("Running sort command on {} paths", args.paths.len());
    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let batch: Vec<ImageItem> = source.items().collect();
    let images = validate_batch(&batch)?;
    let skipped = batch.len() - images;

    let mut session = Session::new(Arc::new(ZipArchiveEncoder::new()));
    session.initialize(|| load_classifier(args))?;
    session.submit(batch)?;

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = ProgressBar::new(args.quiet, show_progress);

    match session.process(&progress) {
        Ok(snapshot) => debug!("Classified {} photo(s)", snapshot.processed),
        Err(SessionError::ArchiveFailed(message)) => {
            warn!("Archive build failed ({message}), retrying once");
            session.retry_archive()?;
        }
        Err(e) => return Err(e.into()),
    }

    let archive = session.download()?;
    let path = args.archive_path();
    write_archive(&path, archive.bytes())?;

    let summary = SortSummary::new(
        path,
        archive.bytes().len(),
        session.snapshot(),
        skipped,
        session.diagnostics().to_vec(),
    );
    println!("{}", summary.render(args.format(), args.pretty)?);

    Ok(exit_code(&summary.counts))
}

fn exit_code(counts: &BucketCounts) -> ExitCode {
    if counts.unknown > 0 {
        ExitCode::Unsorted
    } else {
        ExitCode::Success
    }
}

fn load_classifier(args: &SortArgs) -> Result<Arc<dyn ImageClassifier>> {
    let store = args.model_store();
    debug!("Using models directory: {}", store.dir().display());

    let paths = store.model_paths()?;
    let analyzer = CandleGenderAnalyzer::load(&paths, args.min_face_confidence(), args.gpu)?;
    let classifier = GenderClassifier::new(Arc::new(analyzer)).with_threshold(args.threshold());
    Ok(Arc::new(classifier))
}

fn write_archive(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
