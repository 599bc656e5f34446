//! Serializable reports printed by the CLI.

use std::collections::BTreeMap;

use newsdata::{NewsBatch, NewsItem};
use serde::{Deserialize, Serialize};

use burn::prelude::Backend;

/// Feature shapes of a single dataset item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemShapes {
    pub content_tokens: Vec<usize>,
    pub content_sentence_lengths: Vec<usize>,
    pub comment_tokens: Vec<usize>,
    pub comment_sentence_lengths: Vec<usize>,
    pub comment_lengths: Vec<usize>,
    pub entity_tokens: Vec<usize>,
    pub clip_entities: Vec<usize>,
    pub clip_claims: Vec<usize>,
    pub image: Vec<usize>,
    pub label: i64,
}

impl ItemShapes {
    pub fn from_item(item: &NewsItem) -> Self {
        let i = &item.inputs;
        Self {
            content_tokens: i.content.tokens.shape.clone(),
            content_sentence_lengths: i.content.sentence_lengths.shape.clone(),
            comment_tokens: i.comments.tokens.shape.clone(),
            comment_sentence_lengths: i.comments.sentence_lengths.shape.clone(),
            comment_lengths: i.comments.comment_lengths.shape.clone(),
            entity_tokens: i.entities.tokens.shape.clone(),
            clip_entities: i.clip_entities.entities.shape.clone(),
            clip_claims: i.clip_entities.claims.shape.clone(),
            image: i.image.shape.clone(),
            label: item.label,
        }
    }
}

/// Tensor dims of one padded batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchShapes {
    pub size: usize,
    pub content_tokens: Vec<usize>,
    pub comment_tokens: Vec<usize>,
    pub entity_tokens: Vec<usize>,
    pub clip_entities: Vec<usize>,
    pub clip_claims: Vec<usize>,
    pub images: Vec<usize>,
}

impl BatchShapes {
    pub fn from_batch<B: Backend>(batch: &NewsBatch<B>) -> Self {
        Self {
            size: batch.len(),
            content_tokens: batch.content_tokens.dims().to_vec(),
            comment_tokens: batch.comment_tokens.dims().to_vec(),
            entity_tokens: batch.entity_tokens.dims().to_vec(),
            clip_entities: batch.clip_entities.dims().to_vec(),
            clip_claims: batch.clip_claims.dims().to_vec(),
            images: batch.images.dims().to_vec(),
        }
    }
}

/// Output of the `check` subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub bundle: String,
    pub variant: String,
    pub samples: usize,
    pub labels: BTreeMap<i64, usize>,
    pub first_item: Option<ItemShapes>,
    pub first_batch: Option<BatchShapes>,
}

/// Format a shape as `[a, b, c]`.
pub fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("[{}]", dims.join(", "))
}
