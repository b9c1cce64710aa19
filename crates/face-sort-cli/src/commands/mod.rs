//! CLI command definitions and handlers.

pub mod models;
pub mod sort;

use clap::{Parser, Subcommand};

/// face-sort - sort photos into Boys, Girls and Unsorted folders by the
/// gender of the main face
#[derive(Parser)]
#[command(name = "face-sort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared sort arguments (paths, thresholds, output).
    #[command(flatten)]
    pub sort: sort::SortArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Sort photos into a zip archive
    Sort(sort::SortArgs),
    /// Manage model weights
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every photo was sorted into Boys or Girls.
    Success = 0,
    /// The archive was written but some photos are unsorted.
    Unsorted = 1,
    /// The run failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
