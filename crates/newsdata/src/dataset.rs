//! Index-based dataset over preprocessed news samples.
//!
//! `load_preprocessed` resolves which bundle to read from the load options,
//! drops image-less articles on request and optionally rearranges image
//! features into the IHAN sentence/word layout. The result implements
//! burn's `Dataset` so it plugs straight into a `DataLoaderBuilder`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use burn::data::dataset::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::reader::BundleReader;
use crate::types::{FloatArray, NewsItem, NewsSample};

/// Width of one IHAN "word" taken from the image features.
const IHAN_WORD: usize = 98;
/// IHAN word width after zero padding, matching the 100-d text embeddings.
const IHAN_PADDED_WORD: usize = 100;

/// Which preprocessed bundle file to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleVariant {
    /// Features from a specific image backbone (`preprocessed_{backbone}`).
    Backbone(String),
    Kahan,
    KahanExcludeWithNoImage,
    Clip,
}

impl BundleVariant {
    /// Pick the variant the way the training scripts do: CLIP wins, then the
    /// KAHAN variants, then the plain backbone bundle.
    pub fn select(options: &LoadOptions) -> Self {
        if options.use_clip {
            Self::Clip
        } else if options.kahan && options.exclude_with_no_image {
            Self::KahanExcludeWithNoImage
        } else if options.kahan {
            Self::Kahan
        } else {
            Self::Backbone(options.backbone.clone())
        }
    }

    pub fn file_stem(&self) -> String {
        match self {
            Self::Backbone(name) => format!("preprocessed_{name}"),
            Self::Kahan => "preprocessed_kahan".to_string(),
            Self::KahanExcludeWithNoImage => {
                "preprocessed_kahan_exclude_with_no_image".to_string()
            }
            Self::Clip => "preprocessed_clip".to_string(),
        }
    }

    /// `{data_dir}/{data_source}/{stem}.parquet`
    pub fn path(&self, data_dir: &Path, data_source: &str) -> PathBuf {
        data_dir
            .join(data_source)
            .join(format!("{}.parquet", self.file_stem()))
    }
}

impl fmt::Display for BundleVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_stem())
    }
}

/// Options controlling which bundle is read and how samples are shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Image backbone the features came from (`vgg19`, `resnet50`, ...).
    pub backbone: String,
    /// Keep only articles with a non-zero image representation.
    pub exclude_with_no_image: bool,
    pub kahan: bool,
    /// Rearrange image features into IHAN sentences of 98-d words.
    pub use_ihan: bool,
    pub use_clip: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            backbone: "vgg19".to_string(),
            exclude_with_no_image: false,
            kahan: false,
            use_ihan: false,
            use_clip: false,
        }
    }
}

/// Number of IHAN sentences (and words per sentence) for a backbone.
pub fn ihan_split(backbone: &str) -> Result<usize, DataError> {
    match backbone {
        "vgg19" => Ok(16),
        "resnet50" => Ok(32),
        other => Err(DataError::UnsupportedBackbone(other.to_string())),
    }
}

/// Reshape flat image features into `[split, split, 100]`.
///
/// The features are cut into `split * split` words of 98 values, each
/// zero-padded to 100.
pub fn ihan_reshape(image: &FloatArray, split: usize) -> Result<FloatArray, DataError> {
    let expected = split * split * IHAN_WORD;
    if image.len() != expected {
        return Err(DataError::InvalidShape {
            field: "image".to_string(),
            reason: format!(
                "IHAN layout with split {split} needs {expected} values, found {} (shape {:?})",
                image.len(),
                image.shape
            ),
        });
    }

    let mut values = Vec::with_capacity(split * split * IHAN_PADDED_WORD);
    for word in image.values.chunks(IHAN_WORD) {
        values.extend_from_slice(word);
        values.extend(std::iter::repeat(0.0).take(IHAN_PADDED_WORD - IHAN_WORD));
    }
    FloatArray::new(vec![split, split, IHAN_PADDED_WORD], values)
}

/// Load a preprocessed bundle as a dataset.
pub fn load_preprocessed(
    data_dir: &Path,
    data_source: &str,
    options: &LoadOptions,
) -> Result<NewsDataset, DataError> {
    let variant = BundleVariant::select(options);
    let path = variant.path(data_dir, data_source);
    let mut samples = BundleReader::read_all(&path)?;
    let total = samples.len();

    if options.exclude_with_no_image {
        samples.retain(NewsSample::has_image);
    }

    tracing::info!(
        variant = %variant,
        total,
        kept = samples.len(),
        "Loaded preprocessed samples"
    );

    if options.use_ihan {
        let split = ihan_split(&options.backbone)?;
        for sample in &mut samples {
            sample.image = ihan_reshape(&sample.image, split)?;
        }
    }

    NewsDataset::new(samples)
}

/// In-memory dataset of reconstructed news samples.
#[derive(Debug, Clone)]
pub struct NewsDataset {
    samples: Vec<NewsSample>,
}

impl NewsDataset {
    /// Build a dataset, checking per-field ranks and a common image shape.
    pub fn new(samples: Vec<NewsSample>) -> Result<Self, DataError> {
        for sample in &samples {
            sample.validate()?;
        }
        if let Some(first) = samples.first() {
            for (index, sample) in samples.iter().enumerate().skip(1) {
                if sample.image.shape != first.image.shape {
                    return Err(DataError::ImageShapeMismatch {
                        index,
                        expected: first.image.shape.clone(),
                        found: sample.image.shape.clone(),
                    });
                }
            }
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[NewsSample] {
        &self.samples
    }

    /// Image shape shared by every sample.
    pub fn image_shape(&self) -> Option<&[usize]> {
        self.samples.first().map(|s| s.image.shape.as_slice())
    }

    /// Sample count per label value.
    pub fn label_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label).or_default() += 1;
        }
        counts
    }

    /// Shuffle with `seed` and split off the first `train_ratio` share as
    /// the training set.
    pub fn split(self, train_ratio: f64, seed: u64) -> (NewsDataset, NewsDataset) {
        let mut samples = self.samples;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        samples.shuffle(&mut rng);

        let n_train = ((samples.len() as f64) * train_ratio.clamp(0.0, 1.0)).round() as usize;
        let valid = samples.split_off(n_train.min(samples.len()));
        (NewsDataset { samples }, NewsDataset { samples: valid })
    }
}

impl Dataset<NewsItem> for NewsDataset {
    fn get(&self, index: usize) -> Option<NewsItem> {
        self.samples.get(index).cloned().map(NewsItem::from)
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
