//! Supervised epoch loop with best-validation-accuracy checkpointing.
//!
//! The model-specific parts (forward pass, loss, evaluation) are supplied by
//! a [`ClassificationTask`]; this module owns data loading, the Adam
//! optimizer, bookkeeping, and checkpoint selection.

use std::time::Instant;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataloader::DataLoaderBuilder;
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::training::checkpoint::{save_model, timestamp, SaveInfo};
use crate::training::early_stop::EarlyStopper;
use crate::training::metrics::{EpochMetrics, RunningTotals, TrainHistory};
use crate::training::report::{Progressor, RunLog};

/// Hyperparameters for [`train_iters`].
#[derive(Config, Debug)]
pub struct TrainConfig {
    /// Number of passes over the training set.
    #[config(default = 100)]
    pub epochs: usize,
    /// Adam learning rate.
    #[config(default = 0.01)]
    pub learning_rate: f64,
    /// L2 penalty added to gradients by Adam.
    #[config(default = 1e-3)]
    pub weight_decay: f64,
    #[config(default = 32)]
    pub batch_size: usize,
    /// Progress bar window, in batches.
    #[config(default = 1000)]
    pub print_every: usize,
    /// Seed for the per-epoch shuffle of the training set.
    #[config(default = 42)]
    pub shuffle_seed: u64,
    /// Data loader worker threads; 0 loads on the training thread.
    #[config(default = 0)]
    pub num_workers: usize,
    /// Stop when validation loss stops improving.
    #[config(default = false)]
    pub early_stopping: bool,
    #[config(default = 6)]
    pub patience: usize,
    #[config(default = 0.001)]
    pub min_delta: f64,
}

/// Result of one optimizer step, reported by the task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    /// Mean loss over the batch.
    pub loss: f64,
    /// Correctly classified samples in the batch.
    pub correct: usize,
    pub batch_len: usize,
}

/// Result of evaluating a model on a held-out set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalOutput {
    pub loss: f64,
    pub accuracy: f64,
    pub predictions: Vec<i64>,
    pub targets: Vec<i64>,
}

/// Model-specific training and evaluation logic.
///
/// `train_step` runs forward, backward and `optimizer.step` on one batch and
/// returns the updated model. `evaluate` runs on the inner (non-autodiff)
/// model over a whole dataset.
pub trait ClassificationTask<B: AutodiffBackend, M: AutodiffModule<B>> {
    type Item;
    type Batch;

    fn train_step<O: Optimizer<M, B>>(
        &self,
        model: M,
        batch: Self::Batch,
        optimizer: &mut O,
        lr: f64,
    ) -> anyhow::Result<(M, StepOutput)>;

    fn evaluate(
        &self,
        model: &M::InnerModule,
        validset: &dyn Dataset<Self::Item>,
    ) -> anyhow::Result<EvalOutput>;
}

/// Trained model plus its learning curves.
#[derive(Debug)]
pub struct TrainOutcome<M> {
    pub model: M,
    pub history: TrainHistory,
}

/// Feed `dataset` to `f` in order, `batch_size` items at a time.
///
/// Used by [`ClassificationTask::evaluate`] implementations, which need a
/// deterministic pass without the shuffling data loader.
pub fn eval_batches<I, O, Bt>(
    dataset: &dyn Dataset<I>,
    batcher: &Bt,
    batch_size: usize,
    mut f: impl FnMut(O) -> anyhow::Result<()>,
) -> anyhow::Result<()>
where
    Bt: Batcher<I, O>,
{
    let batch_size = batch_size.max(1);
    let len = dataset.len();
    let mut start = 0;
    while start < len {
        let end = (start + batch_size).min(len);
        let items = (start..end)
            .map(|i| {
                dataset
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("Dataset item {i} missing (len {len})"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        f(batcher.batch(items))?;
        start = end;
    }
    Ok(())
}

/// Run the epoch loop.
///
/// Each epoch draws shuffled batches from `trainset`, hands them to
/// `task.train_step`, then evaluates on `validset`. Whenever validation
/// accuracy strictly exceeds the best so far (initially 0) the model is
/// saved to `save_info.model_path()`.
///
/// Train loss and accuracy are normalized by `trainset.len()`.
///
/// # Returns
/// The model after the last epoch and the recorded history. The best model
/// is the one on disk at `history.best_checkpoint`.
#[allow(clippy::too_many_arguments)]
pub fn train_iters<B, M, T, D, Bt>(
    config: &TrainConfig,
    mut model: M,
    trainset: D,
    validset: &dyn Dataset<T::Item>,
    batcher: Bt,
    task: &T,
    save_info: &SaveInfo,
    run_log: &mut RunLog,
) -> anyhow::Result<TrainOutcome<M>>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    T: ClassificationTask<B, M>,
    T::Item: Send + Sync + Clone + std::fmt::Debug + 'static,
    T::Batch: Send + Clone + std::fmt::Debug + 'static,
    D: Dataset<T::Item> + 'static,
    Bt: Batcher<T::Item, T::Batch> + Clone + 'static,
{
    let train_len = trainset.len();
    if train_len == 0 {
        return Err(anyhow::anyhow!("Training set is empty"));
    }

    let mut builder = DataLoaderBuilder::new(batcher)
        .batch_size(config.batch_size.max(1))
        .shuffle(config.shuffle_seed);
    if config.num_workers > 0 {
        builder = builder.num_workers(config.num_workers);
    }
    let loader = builder.build(trainset);

    let mut optimizer = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay as f32)))
        .init::<B, M>();

    tracing::info!(
        epochs = config.epochs,
        lr = config.learning_rate,
        weight_decay = config.weight_decay,
        batch_size = config.batch_size,
        train = train_len,
        valid = validset.len(),
        fold = save_info.fold,
        "Starting training"
    );

    let mut history = TrainHistory::new();
    let mut stopper = config
        .early_stopping
        .then(|| EarlyStopper::new(config.patience, config.min_delta));
    let mut progress = Progressor::new(config.print_every);
    let mut totals = RunningTotals::new();
    let train_start = Instant::now();

    for epoch in 0..config.epochs {
        totals.reset();

        for batch in loader.iter() {
            let (updated, step) =
                task.train_step(model, batch, &mut optimizer, config.learning_rate)?;
            model = updated;
            totals.update(&step);
            progress.tick();
            progress.set_message(format!("epoch {epoch} loss {:.4}", step.loss));
        }

        let eval = task.evaluate(&model.valid(), validset)?;
        let (train_loss, train_acc) = totals.finish(train_len);
        let metrics = EpochMetrics {
            epoch,
            train_loss,
            train_acc,
            valid_loss: eval.loss,
            valid_acc: eval.accuracy,
        };
        history.push(&metrics);

        if eval.accuracy > history.best_accuracy {
            history.best_accuracy = eval.accuracy;
            let written = save_model::<B, M>(&model, &save_info.model_path())?;
            run_log.log(&format!(
                "Model {} save at {} with acc: {:.4}",
                written.display(),
                timestamp(),
                eval.accuracy
            ))?;
            history.best_checkpoint = Some(written);
        }

        tracing::info!(
            epoch,
            train_loss = format!("{train_loss:.4}"),
            train_acc = format!("{train_acc:.4}"),
            valid_loss = format!("{:.4}", eval.loss),
            valid_acc = format!("{:.4}", eval.accuracy),
            "Epoch finished"
        );
        run_log.log(&format!(
            "Epoch {epoch}: train loss {train_loss:.4} acc {train_acc:.4} | valid loss {:.4} acc {:.4}",
            eval.loss, eval.accuracy
        ))?;

        progress.maybe_reset(epoch, config.epochs);

        if let Some(stopper) = stopper.as_mut() {
            if stopper.early_stop(eval.loss) {
                history.stopped_early_at = Some(epoch);
                tracing::info!(
                    epoch,
                    patience = config.patience,
                    best_loss = stopper.best_loss(),
                    "Early stopping: validation loss stopped improving"
                );
                break;
            }
        }
    }
    progress.finish();

    tracing::info!(
        epochs = history.epochs(),
        elapsed_secs = format!("{:.1}", train_start.elapsed().as_secs_f64()),
        "Training loop finished"
    );
    run_log.log(&format!("The highest accuracy is {}", history.best_accuracy))?;

    Ok(TrainOutcome { model, history })
}
