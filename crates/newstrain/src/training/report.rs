//! Console progress and the optional plain-text run log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

/// Batch progress bar with a fixed capacity of `print_every` ticks.
///
/// When the bar fills up it is reset so the next window starts from zero,
/// except during the final epoch where it is left full.
pub struct Progressor {
    bar: ProgressBar,
    capacity: u64,
    count: u64,
}

impl Progressor {
    pub fn new(capacity: usize) -> Self {
        Self::with_bar(ProgressBar::new(capacity as u64), capacity)
    }

    /// A progressor that draws nothing, for tests and non-interactive runs.
    pub fn hidden(capacity: usize) -> Self {
        Self::with_bar(ProgressBar::hidden(), capacity)
    }

    fn with_bar(bar: ProgressBar, capacity: usize) -> Self {
        let capacity = capacity.max(1) as u64;
        bar.set_length(capacity);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self {
            bar,
            capacity,
            count: 0,
        }
    }

    /// Advance by one batch.
    pub fn tick(&mut self) {
        self.count += 1;
        self.bar.inc(1);
    }

    pub fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    /// Reset the window if it is full and this is not the last epoch.
    ///
    /// Returns `true` if a reset happened.
    pub fn maybe_reset(&mut self, epoch: usize, epochs: usize) -> bool {
        if self.count >= self.capacity && epoch + 1 < epochs {
            self.count = 0;
            self.bar.reset();
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

/// Optional append-only text log that mirrors progress messages.
///
/// Every message is also emitted as a `tracing` event.
#[derive(Debug, Default)]
pub struct RunLog {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl RunLog {
    /// A log that only emits tracing events.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open `path` for appending, creating parent directories.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open run log {}: {e}", path.display()))?;
        Ok(Self {
            file: Some(file),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&mut self, msg: &str) -> anyhow::Result<()> {
        tracing::info!("{msg}");
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{msg}")?;
        }
        Ok(())
    }
}
