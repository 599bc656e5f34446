use std::path::PathBuf;

/// Errors raised while loading news corpora and tensor bundles.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("preprocessed bundle not found at {0}; run preprocessing first")]
    BundleNotFound(PathBuf),

    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}: row {row}: {reason}")]
    BadRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("bundle column '{column}': {reason}")]
    BadColumn { column: String, reason: String },

    #[error("invalid shape for {field}: {reason}")]
    InvalidShape { field: String, reason: String },

    #[error("image backbone '{0}' has no IHAN layout (expected vgg19 or resnet50)")]
    UnsupportedBackbone(String),

    #[error("inconsistent image shapes: sample 0 has {expected:?}, sample {index} has {found:?}")]
    ImageShapeMismatch {
        index: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}
