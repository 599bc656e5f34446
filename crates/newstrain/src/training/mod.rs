//! Training pipeline: loss helpers, epoch metrics, early stopping,
//! checkpointing, progress reporting, and the epoch loop.

pub mod checkpoint;
pub mod early_stop;
pub mod loss;
pub mod metrics;
pub mod report;
pub mod trainer;
