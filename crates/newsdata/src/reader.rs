//! Reads preprocessed news samples from Parquet tensor bundles.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::array::*;
use arrow::datatypes::{ArrowPrimitiveType, Float32Type, Int64Type, UInt32Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;

use crate::error::DataError;
use crate::types::{
    ClipEntityFeatures, CommentFeatures, ContentFeatures, EntityFeatures, NewsSample, RaggedArray,
};

/// Counts over a bundle file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BundleSummary {
    pub samples: usize,
    /// Samples whose image representation is not all zeros.
    pub with_image: usize,
    /// Sample count per label value.
    pub labels: BTreeMap<i64, usize>,
    /// Image shape of the first sample, if any.
    pub image_shape: Option<Vec<usize>>,
    pub max_sentences: usize,
    pub max_comments: usize,
    pub max_entities: usize,
}

/// Static methods for reading bundle files.
pub struct BundleReader;

impl BundleReader {
    /// Read and validate every sample of a bundle.
    pub fn read_all(path: &Path) -> Result<Vec<NewsSample>, DataError> {
        if !path.exists() {
            return Err(DataError::BundleNotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut samples = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            samples.extend(extract_samples_from_batch(&batch)?);
        }

        tracing::debug!(
            count = samples.len(),
            path = %path.display(),
            "Read preprocessed bundle"
        );
        Ok(samples)
    }

    /// Compute summary counts for a bundle.
    pub fn read_summary(path: &Path) -> Result<BundleSummary, DataError> {
        let samples = Self::read_all(path)?;
        let mut summary = BundleSummary {
            samples: samples.len(),
            image_shape: samples.first().map(|s| s.image.shape.clone()),
            ..Default::default()
        };
        for sample in &samples {
            if sample.has_image() {
                summary.with_image += 1;
            }
            *summary.labels.entry(sample.label).or_default() += 1;
            summary.max_sentences = summary.max_sentences.max(sample.content.tokens.dim(0));
            summary.max_comments = summary.max_comments.max(sample.comments.tokens.dim(0));
            summary.max_entities = summary.max_entities.max(sample.entities.tokens.dim(0));
        }
        Ok(summary)
    }
}

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A, DataError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DataError::BadColumn {
            column: name.to_string(),
            reason: "missing".to_string(),
        })?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| DataError::BadColumn {
            column: name.to_string(),
            reason: format!("unexpected type {}", std::any::type_name::<A>()),
        })
}

fn list_values<T: ArrowPrimitiveType>(
    lists: &ListArray,
    row: usize,
    name: &str,
) -> Result<Vec<T::Native>, DataError> {
    let values = lists.value(row);
    let values = values
        .as_any()
        .downcast_ref::<PrimitiveArray<T>>()
        .ok_or_else(|| DataError::BadColumn {
            column: name.to_string(),
            reason: format!("list items are not {:?}", T::DATA_TYPE),
        })?;
    Ok(values.values().to_vec())
}

/// Column handles for one ragged array (values + shape).
struct RaggedColumn<'a> {
    name: &'static str,
    values: &'a ListArray,
    shapes: &'a ListArray,
}

impl<'a> RaggedColumn<'a> {
    fn new(batch: &'a RecordBatch, name: &'static str) -> Result<Self, DataError> {
        Ok(Self {
            name,
            values: column::<ListArray>(batch, name)?,
            shapes: column::<ListArray>(batch, &format!("{name}_shape"))?,
        })
    }

    fn get<T: ArrowPrimitiveType>(&self, row: usize) -> Result<RaggedArray<T::Native>, DataError> {
        let shape = list_values::<UInt32Type>(self.shapes, row, self.name)?
            .into_iter()
            .map(|d| d as usize)
            .collect();
        let array = RaggedArray {
            shape,
            values: list_values::<T>(self.values, row, self.name)?,
        };
        array.check(self.name)?;
        Ok(array)
    }
}

/// Reassemble structured samples from one record batch.
fn extract_samples_from_batch(batch: &RecordBatch) -> Result<Vec<NewsSample>, DataError> {
    let content_tokens = RaggedColumn::new(batch, "content_tokens")?;
    let content_lengths = RaggedColumn::new(batch, "content_sentence_lengths")?;
    let comment_tokens = RaggedColumn::new(batch, "comment_tokens")?;
    let comment_sentences = RaggedColumn::new(batch, "comment_sentence_lengths")?;
    let comment_lengths = RaggedColumn::new(batch, "comment_lengths")?;
    let entity_tokens = RaggedColumn::new(batch, "entity_tokens")?;
    let clip_entities = RaggedColumn::new(batch, "clip_entities")?;
    let clip_claims = RaggedColumn::new(batch, "clip_claims")?;
    let images = RaggedColumn::new(batch, "image")?;

    let num_sentences = column::<Int64Array>(batch, "content_num_sentences")?;
    let num_comments = column::<Int64Array>(batch, "comment_num_comments")?;
    let num_entities = column::<Int64Array>(batch, "entity_num_entities")?;
    let clip_num_entities = column::<Int64Array>(batch, "clip_num_entities")?;
    let labels = column::<Int64Array>(batch, "label")?;

    let mut samples = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let sample = NewsSample {
            content: ContentFeatures {
                tokens: content_tokens.get::<Int64Type>(i)?,
                num_sentences: num_sentences.value(i),
                sentence_lengths: content_lengths.get::<Int64Type>(i)?,
            },
            comments: CommentFeatures {
                tokens: comment_tokens.get::<Int64Type>(i)?,
                num_comments: num_comments.value(i),
                sentence_lengths: comment_sentences.get::<Int64Type>(i)?,
                comment_lengths: comment_lengths.get::<Int64Type>(i)?,
            },
            entities: EntityFeatures {
                tokens: entity_tokens.get::<Int64Type>(i)?,
                num_entities: num_entities.value(i),
            },
            clip_entities: ClipEntityFeatures {
                entities: clip_entities.get::<Float32Type>(i)?,
                claims: clip_claims.get::<Float32Type>(i)?,
                num_entities: clip_num_entities.value(i),
            },
            image: images.get::<Float32Type>(i)?,
            label: labels.value(i),
        };
        sample.validate()?;
        samples.push(sample);
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BundleWriter;
    use tempfile::TempDir;

    #[test]
    fn test_missing_bundle_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = BundleReader::read_all(&tmp.path().join("nope.parquet")).unwrap_err();
        assert!(matches!(err, DataError::BundleNotFound(_)));
        assert!(err.to_string().contains("run preprocessing first"));
    }

    #[test]
    fn test_empty_bundle_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.parquet");
        BundleWriter::new(path.clone()).finish().unwrap();

        assert!(BundleReader::read_all(&path).unwrap().is_empty());
        let summary = BundleReader::read_summary(&path).unwrap();
        assert_eq!(summary.samples, 0);
        assert!(summary.image_shape.is_none());
    }
}
