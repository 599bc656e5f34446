//! Pretrained word vectors in word2vec text format (GloVe conversions,
//! Twitter GloVe, Wikipedia2Vec exports).

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::error::DataError;

/// Token used for out-of-vocabulary words; its vector is the mean of all vectors.
pub const UNK_TOKEN: &str = "_unk_";
/// Padding token; its vector is all zeros.
pub const PAD_TOKEN: &str = "_pad_";

/// A vocabulary with one dense vector per word.
#[derive(Debug, Clone)]
pub struct WordVectors {
    words: Vec<String>,
    index: HashMap<String, usize>,
    vectors: Vec<f32>,
    dim: usize,
}

impl WordVectors {
    /// Build from `(word, vector)` pairs. Later duplicates are ignored.
    pub fn from_pairs(dim: usize, pairs: Vec<(String, Vec<f32>)>) -> Result<Self, DataError> {
        let mut wv = Self {
            words: Vec::with_capacity(pairs.len()),
            index: HashMap::with_capacity(pairs.len()),
            vectors: Vec::with_capacity(pairs.len() * dim),
            dim,
        };
        for (word, vector) in pairs {
            wv.add_vector(word, vector)?;
        }
        Ok(wv)
    }

    /// Load `count dim` header followed by `word v1 .. vdim` rows.
    pub fn load_word2vec_text(path: &Path) -> Result<Self, DataError> {
        let file = std::fs::File::open(path)?;
        let mut lines = std::io::BufReader::new(file).lines();

        let bad = |row: usize, reason: String| DataError::BadRow {
            path: path.to_path_buf(),
            row,
            reason,
        };

        let header = lines
            .next()
            .ok_or_else(|| bad(0, "empty file".to_string()))??;
        let mut parts = header.split_whitespace();
        let (count, dim) = match (
            parts.next().and_then(|p| p.parse::<usize>().ok()),
            parts.next().and_then(|p| p.parse::<usize>().ok()),
        ) {
            (Some(c), Some(d)) if d > 0 => (c, d),
            _ => return Err(bad(0, format!("invalid header '{header}'"))),
        };

        let mut pairs = Vec::with_capacity(count);
        for (i, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = i + 1;
            let mut fields = line.split(' ').filter(|f| !f.is_empty());
            let word = fields
                .next()
                .ok_or_else(|| bad(row, "missing word".to_string()))?
                .to_string();
            let vector = fields
                .map(|f| f.parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| bad(row, format!("bad value for '{word}': {e}")))?;
            if vector.len() != dim {
                return Err(bad(
                    row,
                    format!("'{word}' has {} values, header says {dim}", vector.len()),
                ));
            }
            pairs.push((word, vector));
        }

        if pairs.len() != count {
            tracing::warn!(
                header_count = count,
                read = pairs.len(),
                path = %path.display(),
                "Word vector count differs from header"
            );
        }

        let wv = Self::from_pairs(dim, pairs)?;
        tracing::info!(
            words = wv.len(),
            dim,
            path = %path.display(),
            "Loaded word vectors"
        );
        Ok(wv)
    }

    /// Append `_unk_` (mean vector) and `_pad_` (zeros) if missing.
    pub fn with_special_tokens(mut self) -> Self {
        if !self.index.contains_key(UNK_TOKEN) {
            let mean = self.mean_vector();
            self.push(UNK_TOKEN.to_string(), mean);
        }
        if !self.index.contains_key(PAD_TOKEN) {
            let zeros = vec![0.0; self.dim];
            self.push(PAD_TOKEN.to_string(), zeros);
        }
        self
    }

    /// Add a word if it is not already present.
    pub fn add_vector(&mut self, word: String, vector: Vec<f32>) -> Result<(), DataError> {
        if vector.len() != self.dim {
            return Err(DataError::InvalidShape {
                field: format!("word vector '{word}'"),
                reason: format!("expected {} values, found {}", self.dim, vector.len()),
            });
        }
        if !self.index.contains_key(&word) {
            self.push(word, vector);
        }
        Ok(())
    }

    fn push(&mut self, word: String, vector: Vec<f32>) {
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend(vector);
    }

    fn mean_vector(&self) -> Vec<f32> {
        let mut mean = vec![0.0f32; self.dim];
        if self.words.is_empty() {
            return mean;
        }
        for row in self.vectors.chunks(self.dim) {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        let n = self.words.len() as f32;
        mean.iter_mut().for_each(|m| *m /= n);
        mean
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Exact lookup.
    pub fn get_index(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Lookup falling back to `_unk_`. `None` only if `_unk_` was never added.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.get_index(word).or_else(|| self.get_index(UNK_TOKEN))
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dim)?;
        self.vectors.get(start..start + self.dim)
    }

    /// Embedding matrix of shape `[vocab, dim]`, rows in index order.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.vectors.clone(), [self.len(), self.dim]),
            device,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    fn write_vectors(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("vectors.txt");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_and_special_tokens() {
        let tmp = TempDir::new().unwrap();
        let path = write_vectors(tmp.path(), "2 3\nthe 1 2 3\nnews 3 4 5\n");

        let wv = WordVectors::load_word2vec_text(&path).unwrap().with_special_tokens();
        assert_eq!(wv.len(), 4);
        assert_eq!(wv.dim(), 3);

        let unk = wv.get_index(UNK_TOKEN).unwrap();
        assert_eq!(wv.vector(unk).unwrap(), &[2.0, 3.0, 4.0]);
        let pad = wv.get_index(PAD_TOKEN).unwrap();
        assert_eq!(wv.vector(pad).unwrap(), &[0.0, 0.0, 0.0]);

        assert_eq!(wv.index_of("news"), Some(1));
        assert_eq!(wv.index_of("hoax"), Some(unk));
        assert_eq!(wv.word(0), Some("the"));
    }

    #[test]
    fn test_special_tokens_idempotent() {
        let wv = WordVectors::from_pairs(1, vec![("a".into(), vec![1.0])])
            .unwrap()
            .with_special_tokens()
            .with_special_tokens();
        assert_eq!(wv.len(), 3);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_vectors(tmp.path(), "1 3\nthe 1 2\n");
        let err = WordVectors::load_word2vec_text(&path).unwrap_err();
        assert!(err.to_string().contains("header says 3"), "{err}");

        let path = write_vectors(tmp.path(), "oops\n");
        assert!(WordVectors::load_word2vec_text(&path).is_err());
    }

    #[test]
    fn test_to_tensor_shape() {
        let wv = WordVectors::from_pairs(
            2,
            vec![("x".into(), vec![1.0, 2.0]), ("y".into(), vec![3.0, 4.0])],
        )
        .unwrap();
        let t = wv.to_tensor::<TestBackend>(&Default::default());
        assert_eq!(t.dims(), [2, 2]);
        let values: Vec<f32> = t.into_data().to_vec().unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
