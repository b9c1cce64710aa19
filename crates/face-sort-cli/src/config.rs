//! Layered TOML configuration.
//!
//! Layers, lowest priority first:
//! - `~/.config/face-sort/config.toml` (or under `XDG_CONFIG_HOME`)
//! - `.face-sort.toml` in the working directory or its nearest ancestor
//! - command-line flags, applied by each command

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// File name of the project-local config.
pub const PROJECT_CONFIG_NAME: &str = ".face-sort.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Classification settings.
    pub classifier: ClassifierConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Classification configuration.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Gender confidence below which a photo is unsorted (0.0-1.0).
    pub threshold: Option<f32>,
    /// Minimum face detection score (0.0-1.0).
    pub min_face_confidence: Option<f32>,
    /// Run inference on a GPU when one is available.
    pub gpu: Option<bool>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where to write the archive.
    pub path: Option<PathBuf>,
    /// Summary format: "text" or "json".
    pub format: Option<String>,
    /// Pretty-print the JSON summary.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Loads the XDG config, then merges the project-local config over it.
    ///
    /// Missing or unparsable files are skipped. Out-of-range values are
    /// reported as a warning on stderr; `SortArgs::with_config` then falls
    /// back to the defaults for them.
    pub fn load() -> Self {
        let layers = [xdg_config_path(), find_project_config()];
        let config = layers
            .into_iter()
            .flatten()
            .filter(|path| {
                let found = path.is_file();
                if !found {
                    debug!("No config at {}", path.display());
                }
                found
            })
            .filter_map(|path| {
                info!("Applying config layer {}", path.display());
                load_file(&path)
            })
            .fold(Self::default(), |mut acc, layer| {
                acc.merge(layer);
                acc
            });

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Checks that values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let ranges = [
            ("classifier.threshold", self.classifier.threshold),
            (
                "classifier.min_face_confidence",
                self.classifier.min_face_confidence,
            ),
        ];
        for (key, value) in ranges {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(format!("{key} must be 0.0-1.0, got {v}"));
                }
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "text" && f != "json" {
                return Err(format!("output.format must be 'text' or 'json', got '{f}'"));
            }
        }

        Ok(())
    }

    /// Merges `other` into this config; values present in `other` win.
    pub(crate) fn merge(&mut self, other: Self) {
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        self.classifier.threshold = other.classifier.threshold.or(self.classifier.threshold);
        self.classifier.min_face_confidence = other
            .classifier
            .min_face_confidence
            .or(self.classifier.min_face_confidence);
        self.classifier.gpu = other.classifier.gpu.or(self.classifier.gpu);

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());

        self.output.path = other.output.path.or_else(|| self.output.path.take());
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("face-sort").join("config.toml"))
}

fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Searches `start` and its parents for the project-local config.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_NAME))
        .find(|path| path.is_file())
}

fn load_file(path: &Path) -> Option<AppConfig> {
    std::fs::read_to_string(path)
        .map_err(|e| warn!("Failed to read config file {}: {e}", path.display()))
        .ok()
        .and_then(|content| {
            toml::from_str(&content)
                .map_err(|e| warn!("Failed to parse config file {}: {e}", path.display()))
                .ok()
        })
}
