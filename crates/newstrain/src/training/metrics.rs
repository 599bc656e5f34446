use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::training::loss::accuracy;
use crate::training::trainer::StepOutput;

/// Per-epoch summary of one training pass plus validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_acc: f64,
    pub valid_loss: f64,
    pub valid_acc: f64,
}

/// Accumulates per-batch step outputs over one epoch.
///
/// Loss is summed as `loss * batch_len`, so dividing by the dataset size
/// gives the sample-weighted mean.
#[derive(Debug, Clone, Default)]
pub struct RunningTotals {
    pub loss_total: f64,
    pub correct: usize,
    pub samples: usize,
    pub batches: usize,
}

impl RunningTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, step: &StepOutput) {
        self.loss_total += step.loss * step.batch_len as f64;
        self.correct += step.correct;
        self.samples += step.batch_len;
        self.batches += 1;
    }

    /// `(loss, accuracy)` normalized by `dataset_len`.
    pub fn finish(&self, dataset_len: usize) -> (f64, f64) {
        let loss = if dataset_len == 0 {
            0.0
        } else {
            self.loss_total / dataset_len as f64
        };
        (loss, accuracy(self.correct, dataset_len))
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Learning curves and best-checkpoint bookkeeping for one training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainHistory {
    pub train_accs: Vec<f64>,
    pub valid_accs: Vec<f64>,
    pub train_losses: Vec<f64>,
    pub valid_losses: Vec<f64>,
    pub best_accuracy: f64,
    pub best_checkpoint: Option<PathBuf>,
    /// Epoch (0-based) at which early stopping fired, if it did.
    pub stopped_early_at: Option<usize>,
}

impl TrainHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, m: &EpochMetrics) {
        self.train_accs.push(m.train_acc);
        self.valid_accs.push(m.valid_acc);
        self.train_losses.push(m.train_loss);
        self.valid_losses.push(m.valid_loss);
    }

    pub fn epochs(&self) -> usize {
        self.train_accs.len()
    }

    /// Metrics for a recorded epoch.
    pub fn get(&self, epoch: usize) -> Option<EpochMetrics> {
        Some(EpochMetrics {
            epoch,
            train_loss: *self.train_losses.get(epoch)?,
            train_acc: *self.train_accs.get(epoch)?,
            valid_loss: *self.valid_losses.get(epoch)?,
            valid_acc: *self.valid_accs.get(epoch)?,
        })
    }

    pub fn last(&self) -> Option<EpochMetrics> {
        self.epochs().checked_sub(1).and_then(|e| self.get(e))
    }

    /// Write the history as pretty JSON, creating parent directories.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| anyhow::anyhow!("Failed to write history to {}: {e}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?;
        serde_json::from_reader(file)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))
    }
}
