//! Supervised train/evaluate driver for the news classifiers.
//!
//! Runs the epoch loop over a burn dataset with Adam, evaluates after every
//! epoch, and keeps the checkpoint with the best validation accuracy.
//! Model forward passes are supplied through [`ClassificationTask`].

pub mod training;

pub use training::checkpoint::{load_model, save_model, timestamp, SaveInfo};
pub use training::early_stop::EarlyStopper;
pub use training::loss::{accuracy, count_correct, cross_entropy, predictions};
pub use training::metrics::{EpochMetrics, RunningTotals, TrainHistory};
pub use training::report::{Progressor, RunLog};
pub use training::trainer::{
    eval_batches, train_iters, ClassificationTask, EvalOutput, StepOutput, TrainConfig,
    TrainOutcome,
};
