//! TOML config loading for the fakenews CLI.
//!
//! Deserializes `configs/data.toml`, which has a `[data]` section (paths)
//! and a `[load]` section (bundle selection), then merges CLI overrides.

use std::path::{Path, PathBuf};

use newsdata::LoadOptions;
use serde::Deserialize;

/// Top-level structure matching `configs/data.toml`.
#[derive(Debug, Deserialize)]
pub struct DataToml {
    pub data: DataSection,
    /// Bundle selection; every field falls back to `LoadOptions::default()`.
    #[serde(default)]
    pub load: LoadOptions,
}

#[derive(Debug, Deserialize)]
pub struct DataSection {
    /// Root holding the TSV corpora and the per-source bundle directories.
    pub data_dir: PathBuf,
    /// Suffix of the records TSV (`{source}_no_ignore_en{suffix}.tsv`).
    #[serde(default)]
    pub suffix: String,
}

/// Optional CLI overrides. `None` keeps the TOML value.
#[derive(Debug, Default, Clone)]
pub struct DataOverrides {
    pub data_dir: Option<PathBuf>,
    pub suffix: Option<String>,
    pub backbone: Option<String>,
    pub exclude_with_no_image: Option<bool>,
    pub kahan: Option<bool>,
    pub use_ihan: Option<bool>,
    pub use_clip: Option<bool>,
}

/// Data settings after merging TOML and CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub data_dir: PathBuf,
    pub suffix: String,
    pub options: LoadOptions,
}

/// Load and deserialize a `DataToml` from a TOML file.
pub fn load_data_toml(path: &Path) -> anyhow::Result<DataToml> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
    let config: DataToml = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded data config");
    Ok(config)
}

/// Merge CLI overrides on top of the TOML values.
///
/// Priority chain: `LoadOptions::default()` < TOML values < CLI flags.
pub fn build_data_settings(toml: DataToml, overrides: &DataOverrides) -> DataSettings {
    let mut options = toml.load;
    if let Some(b) = &overrides.backbone {
        options.backbone = b.clone();
    }
    if let Some(v) = overrides.exclude_with_no_image {
        options.exclude_with_no_image = v;
    }
    if let Some(v) = overrides.kahan {
        options.kahan = v;
    }
    if let Some(v) = overrides.use_ihan {
        options.use_ihan = v;
    }
    if let Some(v) = overrides.use_clip {
        options.use_clip = v;
    }

    DataSettings {
        data_dir: overrides.data_dir.clone().unwrap_or(toml.data.data_dir),
        suffix: overrides.suffix.clone().unwrap_or(toml.data.suffix),
        options,
    }
}

/// Load `path` and apply `overrides`.
pub fn resolve_data_settings(path: &Path, overrides: &DataOverrides) -> anyhow::Result<DataSettings> {
    Ok(build_data_settings(load_data_toml(path)?, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_data_toml() {
        let toml_str = r#"
[data]
data_dir = "/data/fakenews"
suffix = "KaDataset"

[load]
backbone = "resnet50"
exclude_with_no_image = true
kahan = false
use_ihan = true
use_clip = false
"#;
        let config: DataToml = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data.data_dir, PathBuf::from("/data/fakenews"));
        assert_eq!(config.data.suffix, "KaDataset");
        assert_eq!(config.load.backbone, "resnet50");
        assert!(config.load.exclude_with_no_image);
        assert!(config.load.use_ihan);
        assert!(!config.load.use_clip);
    }

    #[test]
    fn test_deserialize_optional_load_section() {
        // load section missing entirely: defaults apply
        let toml_str = r#"
[data]
data_dir = "data"
"#;
        let config: DataToml = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data.suffix, "");
        assert_eq!(config.load, LoadOptions::default());
    }

    #[test]
    fn test_partial_load_section_keeps_defaults() {
        let toml_str = r#"
[data]
data_dir = "data"

[load]
use_clip = true
"#;
        let config: DataToml = toml::from_str(toml_str).unwrap();
        assert!(config.load.use_clip);
        assert_eq!(config.load.backbone, "vgg19");
    }

    #[test]
    fn test_cli_override_priority() {
        let toml_str = r#"
[data]
data_dir = "data"

[load]
backbone = "resnet50"
kahan = true
"#;
        let config: DataToml = toml::from_str(toml_str).unwrap();
        let overrides = DataOverrides {
            data_dir: Some(PathBuf::from("/elsewhere")),
            backbone: Some("vgg19".to_string()),
            use_clip: Some(true),
            ..Default::default()
        };
        let settings = build_data_settings(config, &overrides);
        assert_eq!(settings.data_dir, PathBuf::from("/elsewhere"));
        assert_eq!(settings.options.backbone, "vgg19");
        // TOML value survives when the CLI is silent.
        assert!(settings.options.kahan);
        assert!(settings.options.use_clip);
        assert_eq!(settings.suffix, "");
    }

    #[test]
    fn test_missing_config_names_path() {
        let err = load_data_toml(Path::new("/nonexistent/data.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/data.toml"), "{err}");
    }
}
