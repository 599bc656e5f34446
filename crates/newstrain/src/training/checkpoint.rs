//! Best-model checkpoints stored with burn's named MessagePack recorder.

use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};

/// Timestamp format used in checkpoint log lines.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d %H:%M:%S";

/// Where the best model of a cross-validation fold is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveInfo {
    pub fold: usize,
    pub checkpoint_dir: PathBuf,
}

impl SaveInfo {
    pub fn new(fold: usize, checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            fold,
            checkpoint_dir: checkpoint_dir.into(),
        }
    }

    /// `{checkpoint_dir}/model_{fold}`, without the recorder's extension.
    pub fn model_path(&self) -> PathBuf {
        self.checkpoint_dir.join(format!("model_{}", self.fold))
    }

    /// The file the recorder actually writes (`model_{fold}.mpk`).
    pub fn model_file(&self) -> PathBuf {
        self.model_path().with_extension("mpk")
    }
}

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Save model weights to `path` (extension `.mpk` appended by the recorder).
///
/// Creates the parent directory if needed. Returns the written file path.
pub fn save_model<B: Backend, M: Module<B>>(model: &M, path: &Path) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create checkpoint dir {}: {e}", parent.display())
            })?;
        }
    }
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(path, &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model to {}: {e}", path.display()))?;
    Ok(path.with_extension("mpk"))
}

/// Load weights saved by [`save_model`] into a freshly initialized `model`.
pub fn load_model<B: Backend, M: Module<B>>(
    model: M,
    path: &Path,
    device: &B::Device,
) -> anyhow::Result<M> {
    model
        .load_file(
            path,
            &NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
            device,
        )
        .map_err(|e| anyhow::anyhow!("Failed to load checkpoint from {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::nn::LinearConfig;
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_model_path_layout() {
        let info = SaveInfo::new(3, "ckpt/politifact");
        assert_eq!(info.model_path(), PathBuf::from("ckpt/politifact/model_3"));
        assert_eq!(info.model_file(), PathBuf::from("ckpt/politifact/model_3.mpk"));
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        // e.g. "2024_03_01 12:34:56"
        assert_eq!(ts.len(), 19, "unexpected timestamp '{ts}'");
        assert_eq!(&ts[4..5], "_");
        assert_eq!(&ts[10..11], " ");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let device = Default::default();
        let info = SaveInfo::new(0, tmp.path().join("nested"));

        let model = LinearConfig::new(4, 2).init::<TestBackend>(&device);
        let written = save_model(&model, &info.model_path()).unwrap();
        assert_eq!(written, info.model_file());
        assert!(written.exists());

        let fresh = LinearConfig::new(4, 2).init::<TestBackend>(&device);
        let loaded = load_model(fresh, &info.model_path(), &device).unwrap();

        let original: Vec<f32> = model.weight.val().into_data().to_vec().unwrap();
        let restored: Vec<f32> = loaded.weight.val().into_data().to_vec().unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_load_missing_checkpoint_is_error() {
        let tmp = TempDir::new().unwrap();
        let device = Default::default();
        let model = LinearConfig::new(2, 2).init::<TestBackend>(&device);
        let err = load_model(model, &tmp.path().join("model_9"), &device).unwrap_err();
        assert!(err.to_string().contains("model_9"), "{err}");
    }
}
