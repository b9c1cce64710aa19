//! Model weight store: download, verify and locate the network weights.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use face_sort_core::inference::ModelPaths;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

const CHUNK_SIZE: usize = 64 * 1024;

/// A downloadable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier.
    pub name: &'static str,
    /// Download URL.
    pub url: &'static str,
    /// Expected SHA-256 of the file, when pinned.
    pub sha256: Option<&'static str>,
    /// File name inside the models directory.
    pub filename: &'static str,
}

/// Models the bundled analyzer needs.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "blazeface",
        url: "https://github.com/face-sort/face-sort/releases/download/models-v1/blazeface.safetensors",
        sha256: None,
        filename: "blazeface.safetensors",
    },
    ModelInfo {
        name: "gender",
        url: "https://github.com/face-sort/face-sort/releases/download/models-v1/gender.safetensors",
        sha256: None,
        filename: "gender.safetensors",
    },
];

/// Download progress: `(model, bytes so far, total bytes if known)`.
pub type DownloadProgress<'a> = &'a dyn Fn(&str, u64, Option<u64>);

/// Returns the default models directory.
///
/// Uses `XDG_DATA_HOME/face-sort/models` or `~/.local/share/face-sort/models`.
#[must_use]
pub fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("face-sort")
        .join("models")
}

/// Directory holding model weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Creates a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store at [`default_models_dir`].
    #[must_use]
    pub fn at_default_location() -> Self {
        Self::new(default_models_dir())
    }

    /// The store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the model called `name`, installed or not.
    #[must_use]
    pub fn path(&self, name: &str) -> Option<PathBuf> {
        MODELS
            .iter()
            .find(|m| m.name == name)
            .map(|m| self.dir.join(m.filename))
    }

    /// Every known model with whether it is installed.
    #[must_use]
    pub fn list(&self) -> Vec<(&'static str, bool)> {
        MODELS
            .iter()
            .map(|m| (m.name, self.dir.join(m.filename).is_file()))
            .collect()
    }

    /// Returns true if every model is installed.
    #[must_use]
    pub fn all_installed(&self) -> bool {
        self.list().iter().all(|(_, installed)| *installed)
    }

    /// Weight paths for the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing models if any is not installed.
    pub fn model_paths(&self) -> Result<ModelPaths> {
        let missing: Vec<&str> = self
            .list()
            .into_iter()
            .filter_map(|(name, installed)| (!installed).then_some(name))
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing model(s) {} in {}. Run `face-sort models fetch` to download them.",
                missing.join(", "),
                self.dir.display()
            );
        }

        Ok(ModelPaths {
            face_detector: self.dir.join("blazeface.safetensors"),
            gender: self.dir.join("gender.safetensors"),
        })
    }

    /// Downloads every model that is not installed yet.
    ///
    /// Returns the names of the models that were downloaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, a download fails,
    /// or a checksum does not match.
    pub fn ensure(&self, progress: DownloadProgress<'_>) -> Result<Vec<&'static str>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let mut fetched = Vec::new();
        for model in MODELS {
            let path = self.dir.join(model.filename);
            if path.is_file() {
                debug!("Model {} already installed", model.name);
                continue;
            }
            download(model, &path, progress)?;
            fetched.push(model.name);
        }
        Ok(fetched)
    }
}

/// Streams `model` to `path`, hashing as it goes.
///
/// Writes to a `.part` file first so an interrupted download never looks
/// installed.
fn download(model: &ModelInfo, path: &Path, progress: DownloadProgress<'_>) -> Result<()> {
    info!("Downloading model {}", model.name);

    let mut response = reqwest::blocking::get(model.url)
        .with_context(|| format!("Failed to download {}", model.name))?;
    if !response.status().is_success() {
        bail!(
            "Download of {} failed with status {}",
            model.name,
            response.status()
        );
    }

    let total = response.content_length();
    let partial = path.with_extension("part");
    let mut file = File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut received = 0u64;
    loop {
        let n = response
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        received += n as u64;
        progress(model.name, received, total);
    }
    file.flush()?;
    drop(file);

    if let Err(e) = verify(model, &format!("{:x}", hasher.finalize())) {
        if let Err(cleanup) = fs::remove_file(&partial) {
            warn!("Failed to remove {}: {cleanup}", partial.display());
        }
        return Err(e);
    }

    fs::rename(&partial, path)
        .with_context(|| format!("Failed to move {} into place", model.name))?;
    info!("Downloaded {} ({received} bytes)", model.name);
    Ok(())
}

fn verify(model: &ModelInfo, actual: &str) -> Result<()> {
    match model.sha256 {
        None => {
            debug!("No pinned checksum for {}", model.name);
            Ok(())
        }
        Some(expected) if expected.eq_ignore_ascii_case(actual) => Ok(()),
        Some(expected) => bail!(
            "Checksum mismatch for {}: expected {expected}, got {actual}",
            model.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        assert!(default_models_dir().ends_with("face-sort/models"));
    }

    #[test]
    fn test_path() {
        let store = ModelStore::new("/tmp/models");
        assert_eq!(
            store.path("gender"),
            Some(PathBuf::from("/tmp/models/gender.safetensors"))
        );
        assert_eq!(store.path("unknown"), None);
    }

    #[test]
    fn test_model_paths_reports_missing() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let store = ModelStore::new(dir.path());
        assert!(!store.all_installed());

        let err = store.model_paths().map_err(|e| e.to_string());
        assert!(err.is_err_and(|m| m.contains("blazeface") && m.contains("gender")));
    }

    #[test]
    fn test_model_paths_when_installed() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        for model in MODELS {
            fs::write(dir.path().join(model.filename), b"weights")
                .unwrap_or_else(|e| panic!("write: {e}"));
        }
        let store = ModelStore::new(dir.path());
        assert!(store.all_installed());

        let paths = store.model_paths();
        assert!(paths.is_ok_and(|p| p.gender.ends_with("gender.safetensors")));
        let nothing_to_fetch = store.ensure(&|_, _, _| {});
        assert!(nothing_to_fetch.is_ok_and(|fetched| fetched.is_empty()));
    }

    #[test]
    fn test_verify() {
        let pinned = ModelInfo {
            sha256: Some("ABCDEF"),
            ..MODELS[0]
        };
        assert!(verify(&pinned, "abcdef").is_ok());
        assert!(verify(&pinned, "000000").is_err());
        assert!(verify(&MODELS[0], "anything").is_ok());
    }
}
