//! Progress bar adapter using indicatif.

use face_sort_core::{Outcome, ProgressEvent, ProgressSink};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};

/// Progress display for a sorting run.
///
/// With a bar, every event moves the bar. Without one, only unsorted items
/// are reported, one line each on stderr.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a progress display.
    ///
    /// `quiet` suppresses all output; otherwise `show_bar` picks between a
    /// bar and per-item lines.
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        let bar = (!quiet && show_bar).then(|| {
            let bar = IndicatifBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });

        Self { bar, quiet }
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started { total } => {
                if let Some(bar) = &self.bar {
                    bar.set_length(total as u64);
                    bar.set_position(0);
                }
            }
            ProgressEvent::Classified {
                name,
                outcome,
                snapshot,
                ..
            } => {
                if let Some(bar) = &self.bar {
                    bar.set_position(snapshot.processed as u64);
                    bar.set_message(name);
                } else if outcome == Outcome::Unknown {
                    eprintln!("{name}: unsorted");
                }
            }
            ProgressEvent::Archiving { files } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(format!("archiving {files} file(s)"));
                }
            }
            ProgressEvent::Finished { snapshot, .. } => {
                if let Some(bar) = &self.bar {
                    let counts = snapshot.counts;
                    bar.finish_with_message(format!(
                        "Done: {} boys, {} girls, {} unsorted",
                        counts.male, counts.female, counts.unknown
                    ));
                }
            }
            ProgressEvent::ArchiveFailed { message } => {
                if let Some(bar) = &self.bar {
                    bar.abandon_with_message("archive failed");
                }
                eprintln!("WARN: archive build failed: {message}");
            }
        }
    }
}
