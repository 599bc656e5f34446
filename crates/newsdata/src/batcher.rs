//! Collates news items into padded burn tensors.
//!
//! Every ragged per-article array is zero-padded to the largest extent in
//! the batch along each axis (at least 1) and stacked on a new leading
//! batch axis.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use burn::tensor::TensorData;

use crate::types::{NewsItem, RaggedArray};

/// A padded mini-batch of news items.
#[derive(Clone, Debug)]
pub struct NewsBatch<B: Backend> {
    /// `[batch, sentences, words]`
    pub content_tokens: Tensor<B, 3, Int>,
    pub content_num_sentences: Tensor<B, 1, Int>,
    /// `[batch, sentences]`
    pub content_sentence_lengths: Tensor<B, 2, Int>,
    /// `[batch, comments, words]`
    pub comment_tokens: Tensor<B, 3, Int>,
    pub comment_num_comments: Tensor<B, 1, Int>,
    /// `[batch, comments]`
    pub comment_sentence_lengths: Tensor<B, 2, Int>,
    /// `[batch, comments]`
    pub comment_lengths: Tensor<B, 2, Int>,
    /// `[batch, entities]`
    pub entity_tokens: Tensor<B, 2, Int>,
    pub entity_num_entities: Tensor<B, 1, Int>,
    /// `[batch, entities, dim]`
    pub clip_entities: Tensor<B, 3>,
    /// `[batch, claims, dim]`
    pub clip_claims: Tensor<B, 3>,
    pub clip_num_entities: Tensor<B, 1, Int>,
    /// Flattened image features, `[batch, features]`.
    pub images: Tensor<B, 2>,
    /// Per-sample image shape, for reshaping `images`.
    pub image_shape: Vec<usize>,
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> NewsBatch<B> {
    pub fn len(&self) -> usize {
        self.labels.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Burn batcher producing [`NewsBatch`]es on a fixed device.
#[derive(Clone, Debug)]
pub struct NewsBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> NewsBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Zero-pad arrays of one rank to a common shape and stack them.
///
/// Returns the flat values and the stacked shape `[batch, dims...]`.
///
/// # Panics
/// Panics if an array's rank differs from `rank`.
pub fn pad_stack<T: Copy + Default>(arrays: &[&RaggedArray<T>], rank: usize) -> (Vec<T>, Vec<usize>) {
    let mut dims = vec![1usize; rank];
    for array in arrays {
        assert_eq!(
            array.rank(),
            rank,
            "array with shape {:?} cannot be stacked at rank {rank}",
            array.shape
        );
        for (d, &n) in dims.iter_mut().zip(&array.shape) {
            *d = (*d).max(n);
        }
    }

    let mut strides = vec![1usize; rank];
    for axis in (0..rank.saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * dims[axis + 1];
    }
    let per_item: usize = dims.iter().product();
    let mut out = vec![T::default(); arrays.len() * per_item];

    for (b, array) in arrays.iter().enumerate() {
        let row_len = array.shape[rank - 1];
        if array.values.is_empty() || row_len == 0 {
            continue;
        }
        for (r, row) in array.values.chunks(row_len).enumerate() {
            let mut offset = b * per_item;
            let mut rem = r;
            for axis in (0..rank - 1).rev() {
                offset += (rem % array.shape[axis]) * strides[axis];
                rem /= array.shape[axis];
            }
            out[offset..offset + row_len].copy_from_slice(row);
        }
    }

    let mut shape = Vec::with_capacity(rank + 1);
    shape.push(arrays.len());
    shape.extend(dims);
    (out, shape)
}

fn int_tensor<B: Backend, const D: usize>(
    arrays: &[&RaggedArray<i64>],
    device: &B::Device,
) -> Tensor<B, D, Int> {
    let (values, shape) = pad_stack(arrays, D - 1);
    Tensor::from_data(TensorData::new(values, shape), device)
}

fn float_tensor<B: Backend, const D: usize>(
    arrays: &[&RaggedArray<f32>],
    device: &B::Device,
) -> Tensor<B, D> {
    let (values, shape) = pad_stack(arrays, D - 1);
    Tensor::from_data(TensorData::new(values, shape), device)
}

fn scalars<B: Backend>(values: Vec<i64>, device: &B::Device) -> Tensor<B, 1, Int> {
    let n = values.len();
    Tensor::from_data(TensorData::new(values, [n]), device)
}

impl<B: Backend> Batcher<NewsItem, NewsBatch<B>> for NewsBatcher<B> {
    fn batch(&self, items: Vec<NewsItem>) -> NewsBatch<B> {
        let device = &self.device;
        let inputs: Vec<_> = items.iter().map(|item| &item.inputs).collect();

        let content_tokens: Vec<_> = inputs.iter().map(|i| &i.content.tokens).collect();
        let content_lengths: Vec<_> = inputs.iter().map(|i| &i.content.sentence_lengths).collect();
        let comment_tokens: Vec<_> = inputs.iter().map(|i| &i.comments.tokens).collect();
        let comment_sentences: Vec<_> = inputs.iter().map(|i| &i.comments.sentence_lengths).collect();
        let comment_lengths: Vec<_> = inputs.iter().map(|i| &i.comments.comment_lengths).collect();
        let entity_tokens: Vec<_> = inputs.iter().map(|i| &i.entities.tokens).collect();
        let clip_entities: Vec<_> = inputs.iter().map(|i| &i.clip_entities.entities).collect();
        let clip_claims: Vec<_> = inputs.iter().map(|i| &i.clip_entities.claims).collect();

        let image_shape = inputs
            .first()
            .map(|i| i.image.shape.clone())
            .unwrap_or_default();
        let flat_images: Vec<RaggedArray<f32>> = inputs
            .iter()
            .map(|i| RaggedArray::from_vec(i.image.values.clone()))
            .collect();
        let flat_refs: Vec<_> = flat_images.iter().collect();

        NewsBatch {
            content_tokens: int_tensor(&content_tokens, device),
            content_num_sentences: scalars(
                inputs.iter().map(|i| i.content.num_sentences).collect(),
                device,
            ),
            content_sentence_lengths: int_tensor(&content_lengths, device),
            comment_tokens: int_tensor(&comment_tokens, device),
            comment_num_comments: scalars(
                inputs.iter().map(|i| i.comments.num_comments).collect(),
                device,
            ),
            comment_sentence_lengths: int_tensor(&comment_sentences, device),
            comment_lengths: int_tensor(&comment_lengths, device),
            entity_tokens: int_tensor(&entity_tokens, device),
            entity_num_entities: scalars(
                inputs.iter().map(|i| i.entities.num_entities).collect(),
                device,
            ),
            clip_entities: float_tensor(&clip_entities, device),
            clip_claims: float_tensor(&clip_claims, device),
            clip_num_entities: scalars(
                inputs.iter().map(|i| i.clip_entities.num_entities).collect(),
                device,
            ),
            images: float_tensor(&flat_refs, device),
            image_shape,
            labels: scalars(items.iter().map(|item| item.label).collect(), device),
        }
    }
}
