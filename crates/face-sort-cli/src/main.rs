//! face-sort CLI - sort photos by detected gender into a zip archive.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{sort::SortArgs, Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load();

    let result = match cli.command {
        Some(Commands::Sort(args)) => sort(args, &config),
        Some(Commands::Models(ref args)) => {
            commands::models::run(args, &config).map(|()| ExitCode::Success)
        }
        None if cli.sort.paths.is_empty() => Err(anyhow::anyhow!(
            "No paths specified. Use --help for usage information."
        )),
        None => sort(cli.sort, &config),
    };

    result
        .unwrap_or_else(|e| {
            eprintln!("error: {e:#}");
            ExitCode::Error
        })
        .into()
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new(level))
        .init();
}

fn sort(args: SortArgs, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let args = SortArgs::with_config(args, config);
    commands::sort::run(&args)
}
