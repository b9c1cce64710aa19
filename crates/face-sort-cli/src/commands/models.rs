//! Models command - manage the face detector and gender weights.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use clap::{Args, Subcommand};
use face_sort_adapters::{ModelStore, MODELS};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download missing models
    Fetch,
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
///
/// # Errors
///
/// Returns an error if a download or checksum verification fails.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let store = args
        .models_dir
        .as_ref()
        .or(config.models.dir.as_ref())
        .map_or_else(ModelStore::at_default_location, ModelStore::new);

    match args.command {
        ModelsCommand::Fetch => fetch_models(&store),
        ModelsCommand::List => {
            list_models(&store);
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", store.dir().display());
            Ok(())
        }
    }
}

fn fetch_models(store: &ModelStore) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );

    let current = Mutex::new(String::new());
    let progress = |name: &str, downloaded: u64, total: Option<u64>| {
        let mut current = current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != name {
            name.clone_into(&mut *current);
            pb.set_position(0);
            if let Some(t) = total {
                pb.set_length(t);
            }
            pb.set_message(name.to_string());
        }
        pb.set_position(downloaded);
    };

    let fetched = store.ensure(&progress)?;

    if fetched.is_empty() {
        pb.finish_and_clear();
        println!("All models already installed in {}", store.dir().display());
    } else {
        pb.finish_with_message(format!("Downloaded {}", fetched.join(", ")));
    }
    Ok(())
}

fn list_models(store: &ModelStore) {
    let models = store.list();

    println!("Models directory: {}", store.dir().display());
    println!();

    for (name, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        let filename = MODELS
            .iter()
            .find(|m| m.name == *name)
            .map_or("unknown", |m| m.filename);
        println!("  {status} {name} ({filename})");
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());
}
