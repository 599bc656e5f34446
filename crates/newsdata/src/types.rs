//! Sample types for preprocessed news bundles and raw TSV corpora.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::DataError;

/// Ground-truth label of a news article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsLabel {
    Fake,
    Real,
}

impl NewsLabel {
    /// Map the integer label used in the TSV files (1 = real, 0 = fake).
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Fake),
            1 => Some(Self::Real),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Self::Fake => 0,
            Self::Real => 1,
        }
    }

    /// Directory name under `news_images/` holding this label's images.
    pub fn image_dir(self) -> &'static str {
        match self {
            Self::Fake => "fake",
            Self::Real => "real",
        }
    }
}

impl fmt::Display for NewsLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.image_dir())
    }
}

/// A user comment with its engagement score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub score: i64,
}

/// One row of a `*_no_ignore_en*.tsv` file after cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNewsRecord {
    /// Article id as written in the TSV.
    pub id: String,
    /// News body, ASCII only.
    pub content: String,
    /// Comments reassembled from the `text<>score::text<>score` encoding.
    pub comments: Vec<Comment>,
    /// Entity mentions, flattened across `||` groups.
    pub entities: Vec<String>,
    /// Image file, if one exists on disk for this article.
    pub image_path: Option<PathBuf>,
    pub label: NewsLabel,
}

/// Row-major dense array with an explicit shape.
///
/// The preprocessed bundle stores every per-article feature as one of these,
/// and shapes differ from article to article (number of sentences, comments,
/// entities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaggedArray<T> {
    pub shape: Vec<usize>,
    pub values: Vec<T>,
}

pub type IntArray = RaggedArray<i64>;
pub type FloatArray = RaggedArray<f32>;

impl<T> RaggedArray<T> {
    /// Build an array, checking that `values` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, values: Vec<T>) -> Result<Self, DataError> {
        let array = Self { shape, values };
        array.check("array")?;
        Ok(array)
    }

    /// A 1-d array over `values`.
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Size along `axis`, 0 if the axis does not exist.
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.get(axis).copied().unwrap_or(0)
    }

    /// Validate the shape/value invariant, naming `field` in the error.
    pub fn check(&self, field: &str) -> Result<(), DataError> {
        if self.shape.is_empty() {
            return Err(DataError::InvalidShape {
                field: field.to_string(),
                reason: "rank-0 arrays are not allowed".to_string(),
            });
        }
        let expected: usize = self.shape.iter().product();
        if expected != self.values.len() {
            return Err(DataError::InvalidShape {
                field: field.to_string(),
                reason: format!(
                    "shape {:?} holds {expected} values, found {}",
                    self.shape,
                    self.values.len()
                ),
            });
        }
        Ok(())
    }

    /// Validate the invariant and require a specific rank.
    pub fn check_rank(&self, field: &str, rank: usize) -> Result<(), DataError> {
        self.check(field)?;
        if self.rank() != rank {
            return Err(DataError::InvalidShape {
                field: field.to_string(),
                reason: format!("expected rank {rank}, found shape {:?}", self.shape),
            });
        }
        Ok(())
    }
}

impl<T: Copy + Default> RaggedArray<T> {
    /// An all-default array of the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        Self {
            shape,
            values: vec![T::default(); n],
        }
    }
}

impl FloatArray {
    /// Sum of all values; an image that sums to zero is a missing image.
    pub fn sum(&self) -> f32 {
        self.values.iter().sum()
    }
}

/// Tokenized news body (`cnt, ln, ls`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFeatures {
    /// Word indices, `[sentences, words]`.
    pub tokens: IntArray,
    pub num_sentences: i64,
    /// Words per sentence, `[sentences]`.
    pub sentence_lengths: IntArray,
}

/// Tokenized user comments (`cmt, le, lsb, lc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentFeatures {
    /// Word indices, `[comments, words]`.
    pub tokens: IntArray,
    pub num_comments: i64,
    /// Sentence count per comment, `[comments]`.
    pub sentence_lengths: IntArray,
    /// Word count per comment, `[comments]`.
    pub comment_lengths: IntArray,
}

/// Knowledge-graph entity indices (`ent, lk`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFeatures {
    /// Entity indices, `[entities]`.
    pub tokens: IntArray,
    pub num_entities: i64,
}

/// CLIP embeddings of entities and their claims (`clip_ent, clip_clm, clip_lk`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipEntityFeatures {
    /// `[entities, dim]`.
    pub entities: FloatArray,
    /// `[claims, dim]`.
    pub claims: FloatArray,
    pub num_entities: i64,
}

/// A fully reconstructed article from a preprocessed bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSample {
    pub content: ContentFeatures,
    pub comments: CommentFeatures,
    pub entities: EntityFeatures,
    pub clip_entities: ClipEntityFeatures,
    /// Image representation from the vision backbone; any rank.
    pub image: FloatArray,
    pub label: i64,
}

impl NewsSample {
    /// Check every field against its documented rank.
    pub fn validate(&self) -> Result<(), DataError> {
        self.content.tokens.check_rank("content.tokens", 2)?;
        self.content
            .sentence_lengths
            .check_rank("content.sentence_lengths", 1)?;
        self.comments.tokens.check_rank("comments.tokens", 2)?;
        self.comments
            .sentence_lengths
            .check_rank("comments.sentence_lengths", 1)?;
        self.comments
            .comment_lengths
            .check_rank("comments.comment_lengths", 1)?;
        self.entities.tokens.check_rank("entities.tokens", 1)?;
        self.clip_entities
            .entities
            .check_rank("clip_entities.entities", 2)?;
        self.clip_entities
            .claims
            .check_rank("clip_entities.claims", 2)?;
        self.image.check("image")?;
        Ok(())
    }

    /// Whether the backbone produced a real image representation.
    pub fn has_image(&self) -> bool {
        self.image.sum() != 0.0
    }
}

/// Multimodal inputs of one dataset item, in model-input order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsInputs {
    pub content: ContentFeatures,
    pub comments: CommentFeatures,
    pub entities: EntityFeatures,
    pub clip_entities: ClipEntityFeatures,
    pub image: FloatArray,
}

/// What `Dataset::get` yields: `(inputs, label)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub inputs: NewsInputs,
    pub label: i64,
}

impl From<NewsSample> for NewsItem {
    fn from(sample: NewsSample) -> Self {
        NewsItem {
            inputs: NewsInputs {
                content: sample.content,
                comments: sample.comments,
                entities: sample.entities,
                clip_entities: sample.clip_entities,
                image: sample.image,
            },
            label: sample.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(NewsLabel::from_i64(1), Some(NewsLabel::Real));
        assert_eq!(NewsLabel::from_i64(0), Some(NewsLabel::Fake));
        assert_eq!(NewsLabel::from_i64(2), None);
        assert_eq!(NewsLabel::Real.as_i64(), 1);
        assert_eq!(NewsLabel::Fake.to_string(), "fake");
    }

    #[test]
    fn test_ragged_array_invariant() {
        assert!(IntArray::new(vec![2, 3], vec![0; 6]).is_ok());
        let err = IntArray::new(vec![2, 3], vec![0; 5]).unwrap_err();
        assert!(err.to_string().contains("holds 6 values"), "{err}");
        assert!(IntArray::new(vec![], vec![]).is_err());

        // Zero-sized axes are fine: an article with no comments.
        let empty = IntArray::new(vec![0, 12], vec![]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.dim(1), 12);
        assert_eq!(empty.dim(5), 0);
    }

    #[test]
    fn test_check_rank() {
        let a = FloatArray::from_vec(vec![1.0, 2.0]);
        assert!(a.check_rank("x", 1).is_ok());
        let err = a.check_rank("clip_entities.claims", 2).unwrap_err();
        assert!(err.to_string().contains("clip_entities.claims"));
    }

    #[test]
    fn test_image_sum() {
        assert!(FloatArray::zeros(vec![4, 4]).sum() == 0.0);
        let img = FloatArray::new(vec![2], vec![0.5, -0.25]).unwrap();
        assert!((img.sum() - 0.25).abs() < 1e-6);
    }
}
