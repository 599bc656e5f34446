//! Writes preprocessed news samples to a Parquet tensor bundle.
//!
//! Every ragged array is stored as two list columns: the flattened values
//! under the field name and the dimensions under `<field>_shape`.

use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::*;
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{ArrowPrimitiveType, DataType, Field, Float32Type, Int64Type, Schema, UInt32Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::error::DataError;
use crate::types::{NewsSample, RaggedArray};

/// Rows per Arrow record batch; keeps list offsets well inside `i32`.
const ROWS_PER_BATCH: usize = 256;

/// Ragged-array columns, in schema order.
pub(crate) const INT_ARRAY_COLUMNS: [&str; 6] = [
    "content_tokens",
    "content_sentence_lengths",
    "comment_tokens",
    "comment_sentence_lengths",
    "comment_lengths",
    "entity_tokens",
];
pub(crate) const FLOAT_ARRAY_COLUMNS: [&str; 3] = ["clip_entities", "clip_claims", "image"];
pub(crate) const SCALAR_COLUMNS: [&str; 5] = [
    "content_num_sentences",
    "comment_num_comments",
    "entity_num_entities",
    "clip_num_entities",
    "label",
];

fn list_field(name: &str, item: DataType) -> Field {
    Field::new(
        name,
        DataType::List(Arc::new(Field::new("item", item, false))),
        false,
    )
}

/// Arrow schema for bundle Parquet files.
pub fn bundle_schema() -> Schema {
    let mut fields = Vec::new();
    for name in INT_ARRAY_COLUMNS {
        fields.push(list_field(name, DataType::Int64));
        fields.push(list_field(&format!("{name}_shape"), DataType::UInt32));
    }
    for name in FLOAT_ARRAY_COLUMNS {
        fields.push(list_field(name, DataType::Float32));
        fields.push(list_field(&format!("{name}_shape"), DataType::UInt32));
    }
    for name in SCALAR_COLUMNS {
        fields.push(Field::new(name, DataType::Int64, false));
    }
    Schema::new(fields)
}

/// Buffers samples and writes them to a bundle file.
pub struct BundleWriter {
    samples: Vec<NewsSample>,
    output_path: PathBuf,
}

impl BundleWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            samples: Vec::new(),
            output_path,
        }
    }

    pub fn record(&mut self, sample: NewsSample) {
        self.samples.push(sample);
    }

    pub fn record_all(&mut self, samples: Vec<NewsSample>) {
        self.samples.extend(samples);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Validate and write all buffered samples, returning the output path.
    pub fn finish(self) -> Result<PathBuf, DataError> {
        for sample in &self.samples {
            sample.validate()?;
        }

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let schema = Arc::new(bundle_schema());
        let file = std::fs::File::create(&self.output_path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), None)?;

        if self.samples.is_empty() {
            writer.write(&RecordBatch::new_empty(schema))?;
        } else {
            for chunk in self.samples.chunks(ROWS_PER_BATCH) {
                writer.write(&build_record_batch(schema.clone(), chunk)?)?;
            }
        }
        writer.close()?;

        tracing::info!(
            samples = self.samples.len(),
            path = %self.output_path.display(),
            "Wrote preprocessed bundle"
        );

        Ok(self.output_path)
    }
}

/// Build one list column from per-row value slices.
fn list_column<T: ArrowPrimitiveType>(rows: &[&[T::Native]]) -> ArrayRef {
    let mut values = Vec::new();
    let mut offsets = vec![0i32];
    for row in rows {
        values.extend_from_slice(row);
        offsets.push(values.len() as i32);
    }
    Arc::new(ListArray::new(
        Arc::new(Field::new("item", T::DATA_TYPE, false)),
        OffsetBuffer::new(offsets.into()),
        Arc::new(PrimitiveArray::<T>::from_iter_values(values)),
        None,
    ))
}

/// Values column followed by its shape column.
fn ragged_columns<T: ArrowPrimitiveType>(arrays: &[&RaggedArray<T::Native>]) -> [ArrayRef; 2] {
    let values: Vec<&[T::Native]> = arrays.iter().map(|a| a.values.as_slice()).collect();
    let shapes: Vec<Vec<u32>> = arrays
        .iter()
        .map(|a| a.shape.iter().map(|&d| d as u32).collect())
        .collect();
    let shape_refs: Vec<&[u32]> = shapes.iter().map(|s| s.as_slice()).collect();
    [list_column::<T>(&values), list_column::<UInt32Type>(&shape_refs)]
}

fn build_record_batch(schema: Arc<Schema>, samples: &[NewsSample]) -> Result<RecordBatch, DataError> {
    let int_arrays: [Vec<&RaggedArray<i64>>; 6] = [
        samples.iter().map(|s| &s.content.tokens).collect(),
        samples.iter().map(|s| &s.content.sentence_lengths).collect(),
        samples.iter().map(|s| &s.comments.tokens).collect(),
        samples.iter().map(|s| &s.comments.sentence_lengths).collect(),
        samples.iter().map(|s| &s.comments.comment_lengths).collect(),
        samples.iter().map(|s| &s.entities.tokens).collect(),
    ];
    let float_arrays: [Vec<&RaggedArray<f32>>; 3] = [
        samples.iter().map(|s| &s.clip_entities.entities).collect(),
        samples.iter().map(|s| &s.clip_entities.claims).collect(),
        samples.iter().map(|s| &s.image).collect(),
    ];
    let scalars: [Vec<i64>; 5] = [
        samples.iter().map(|s| s.content.num_sentences).collect(),
        samples.iter().map(|s| s.comments.num_comments).collect(),
        samples.iter().map(|s| s.entities.num_entities).collect(),
        samples.iter().map(|s| s.clip_entities.num_entities).collect(),
        samples.iter().map(|s| s.label).collect(),
    ];

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for arrays in &int_arrays {
        columns.extend(ragged_columns::<Int64Type>(arrays));
    }
    for arrays in &float_arrays {
        columns.extend(ragged_columns::<Float32Type>(arrays));
    }
    for values in scalars {
        columns.push(Arc::new(Int64Array::from(values)));
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}
