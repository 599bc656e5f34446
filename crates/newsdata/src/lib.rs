//! Data loading for multimodal fake-news classification.
//!
//! Two sources are supported: the cleaned TSV corpora (news text, comments,
//! entities, image paths and entity claims) and preprocessed tensor bundles
//! stored as Parquet. Bundles are reassembled into structured samples and
//! exposed through burn's `Dataset` and `Batcher` traits.

pub mod batcher;
pub mod dataset;
pub mod error;
pub mod raw;
pub mod reader;
pub mod types;
pub mod vectors;
pub mod writer;

pub use batcher::{NewsBatch, NewsBatcher};
pub use dataset::{load_preprocessed, BundleVariant, LoadOptions, NewsDataset};
pub use error::DataError;
pub use raw::{load_entity_claims, load_raw_records, CorpusSummary, EntityClaims, RawCorpus};
pub use reader::{BundleReader, BundleSummary};
pub use types::{
    ClipEntityFeatures, Comment, CommentFeatures, ContentFeatures, EntityFeatures, FloatArray,
    IntArray, NewsInputs, NewsItem, NewsLabel, NewsSample, RaggedArray, RawNewsRecord,
};
pub use vectors::WordVectors;
pub use writer::BundleWriter;
