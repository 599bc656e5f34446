//! Classification loss and accuracy helpers for caller-supplied train steps.
//!
//! All helpers are generic over `B: Backend` and take `(batch, classes)`
//! logits with `(batch,)` integer targets.

use burn::nn::loss::CrossEntropyLossConfig;
use burn::prelude::*;

/// Mean cross-entropy between logits and class targets.
///
/// # Returns
/// Scalar loss tensor of shape `(1,)`.
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    let device = logits.device();
    CrossEntropyLossConfig::new()
        .init(&device)
        .forward(logits, targets)
}

/// Argmax class per row, shape `(batch,)`.
pub fn predictions<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    logits.argmax(1).squeeze::<1>(1)
}

/// Number of rows whose argmax equals the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let correct: i64 = predictions(logits)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem();
    correct as usize
}

/// `correct / total`, 0 for an empty set.
pub fn accuracy(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::backend::Autodiff;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_cross_entropy_confident_and_uniform() {
        let device = Default::default();
        let targets = Tensor::<TestBackend, 1, Int>::from_data(TensorData::from([0i64, 1]), &device);

        let confident = Tensor::<TestBackend, 2>::from_data(
            TensorData::from([[10.0_f32, -10.0], [-10.0, 10.0]]),
            &device,
        );
        let loss: f32 = cross_entropy(confident, targets.clone()).into_scalar().elem();
        assert!(loss < 0.01, "Confident correct logits should give ~0 loss, got {loss}");

        // Equal logits → ln(2)
        let uniform = Tensor::<TestBackend, 2>::zeros([2, 2], &device);
        let loss: f32 = cross_entropy(uniform, targets).into_scalar().elem();
        assert!((loss - 2.0_f32.ln()).abs() < 1e-4, "expected ln 2, got {loss}");
    }

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            TensorData::from([[0.9_f32, 0.1], [0.2, 0.8], [0.7, 0.3]]),
            &device,
        );
        let targets =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::from([0i64, 1, 1]), &device);

        assert_eq!(count_correct(logits.clone(), targets), 2);
        let preds: Vec<i64> = predictions(logits).into_data().to_vec().unwrap();
        assert_eq!(preds, vec![0, 1, 0]);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(3, 4), 0.75);
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn test_cross_entropy_gradient_raises_target_logit() {
        let device = Default::default();
        let logits = Tensor::<TestAutodiffBackend, 2>::zeros([1, 2], &device).require_grad();
        let targets =
            Tensor::<TestAutodiffBackend, 1, Int>::from_data(TensorData::from([1i64]), &device);

        let grads = cross_entropy(logits.clone(), targets).backward();
        let g: Vec<f32> = logits.grad(&grads).unwrap().into_data().to_vec().unwrap();
        // d/dz of CE: softmax - onehot → [0.5, -0.5]
        assert!(g[0] > 0.0 && g[1] < 0.0, "unexpected gradient {g:?}");
    }
}
