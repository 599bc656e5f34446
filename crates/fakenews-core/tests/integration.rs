//! Integration tests for the fakenews CLI pipeline.
//!
//! Each test writes a config TOML plus synthetic corpus or bundle files into
//! a temp directory and drives the subcommand functions directly.

use std::path::{Path, PathBuf};

use fakenews_core::config::{resolve_data_settings, DataOverrides};
use fakenews_core::pipeline::{
    check_dataset, run_bundle_summary, run_check, run_claims, run_raw_summary, BundleSummaryArgs,
    CheckArgs, ClaimsArgs, RawSummaryArgs,
};
use newsdata::{
    BundleVariant, BundleWriter, ClipEntityFeatures, CommentFeatures, ContentFeatures,
    EntityFeatures, FloatArray, IntArray, LoadOptions, NewsSample,
};

fn write_config(dir: &Path, load: &str) -> PathBuf {
    let path = dir.join("data.toml");
    std::fs::write(
        &path,
        format!(
            "[data]\ndata_dir = \"{}\"\n\n[load]\n{load}\n",
            dir.join("data").display()
        ),
    )
    .unwrap();
    path
}

fn make_sample(label: i64, sentences: usize, comments: usize, image: Vec<f32>) -> NewsSample {
    NewsSample {
        content: ContentFeatures {
            tokens: IntArray::new(vec![sentences, 3], vec![1; sentences * 3]).unwrap(),
            num_sentences: sentences as i64,
            sentence_lengths: IntArray::from_vec(vec![3; sentences]),
        },
        comments: CommentFeatures {
            tokens: IntArray::new(vec![comments, 3], vec![2; comments * 3]).unwrap(),
            num_comments: comments as i64,
            sentence_lengths: IntArray::from_vec(vec![1; comments]),
            comment_lengths: IntArray::from_vec(vec![3; comments]),
        },
        entities: EntityFeatures {
            tokens: IntArray::from_vec(vec![5, 6, 7]),
            num_entities: 3,
        },
        clip_entities: ClipEntityFeatures {
            entities: FloatArray::new(vec![3, 2], vec![0.1; 6]).unwrap(),
            claims: FloatArray::new(vec![2, 2], vec![0.2; 4]).unwrap(),
            num_entities: 3,
        },
        image: FloatArray::from_vec(image),
        label,
    }
}

fn write_bundle(dir: &Path, source: &str, options: &LoadOptions, samples: Vec<NewsSample>) {
    let path = BundleVariant::select(options).path(&dir.join("data"), source);
    let mut writer = BundleWriter::new(path);
    writer.record_all(samples);
    writer.finish().unwrap();
}

#[test]
fn test_real_data_toml_is_valid() {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let workspace_root = Path::new(manifest_dir).parent().unwrap().parent().unwrap();
    let toml_path = workspace_root.join("configs").join("data.toml");
    assert!(toml_path.exists(), "configs/data.toml not found");

    let settings = resolve_data_settings(&toml_path, &DataOverrides::default()).unwrap();
    assert_eq!(settings.options, LoadOptions::default());
}

#[test]
fn test_check_dataset_reports_item_and_batch_shapes() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = write_config(tmp.path(), "backbone = \"resnet50\"\nexclude_with_no_image = true");
    let settings = resolve_data_settings(&config, &DataOverrides::default()).unwrap();

    write_bundle(
        tmp.path(),
        "gossipcop",
        &settings.options,
        vec![
            make_sample(0, 2, 1, vec![0.0; 4]),
            make_sample(1, 1, 4, vec![0.5; 4]),
            make_sample(0, 3, 2, vec![0.25; 4]),
        ],
    );

    let report = check_dataset(&settings, "gossipcop", 8).unwrap();
    assert!(report.bundle.ends_with("preprocessed_resnet50.parquet"), "{}", report.bundle);
    // The zero-image sample is dropped.
    assert_eq!(report.samples, 2);
    assert_eq!(report.labels.get(&0), Some(&1));

    let item = report.first_item.unwrap();
    assert_eq!(item.label, 1);
    assert_eq!(item.content_tokens, vec![1, 3]);
    assert_eq!(item.comment_tokens, vec![4, 3]);
    assert_eq!(item.clip_claims, vec![2, 2]);
    assert_eq!(item.image, vec![4]);

    let batch = report.first_batch.unwrap();
    assert_eq!(batch.size, 2);
    assert_eq!(batch.content_tokens, vec![2, 3, 3]);
    assert_eq!(batch.comment_tokens, vec![2, 4, 3]);
    assert_eq!(batch.entity_tokens, vec![2, 3]);
    assert_eq!(batch.images, vec![2, 4]);
}

#[test]
fn test_cli_override_selects_clip_bundle() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = write_config(tmp.path(), "kahan = true");
    let overrides = DataOverrides {
        use_clip: Some(true),
        ..Default::default()
    };
    let settings = resolve_data_settings(&config, &overrides).unwrap();
    write_bundle(
        tmp.path(),
        "politifact",
        &settings.options,
        vec![make_sample(1, 1, 1, vec![1.0; 2])],
    );

    let report = check_dataset(&settings, "politifact", 4).unwrap();
    assert_eq!(report.variant, "preprocessed_clip");
    assert_eq!(report.samples, 1);

    run_check(CheckArgs {
        config: config.clone(),
        data_source: "politifact".to_string(),
        overrides: overrides.clone(),
        batch_size: 4,
        json: true,
    })
    .unwrap();
    run_bundle_summary(BundleSummaryArgs {
        config,
        data_source: "politifact".to_string(),
        overrides,
        json: false,
    })
    .unwrap();
}

#[test]
fn test_missing_bundle_is_reported() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = write_config(tmp.path(), "");
    let err = run_bundle_summary(BundleSummaryArgs {
        config,
        data_source: "politifact".to_string(),
        overrides: DataOverrides::default(),
        json: true,
    })
    .unwrap_err();
    assert!(
        err.to_string().contains("preprocessed_vgg19.parquet"),
        "{err}"
    );
}

#[test]
fn test_raw_summary_and_claims() {
    let tmp = tempfile::TempDir::new().unwrap();
    let config = write_config(tmp.path(), "");
    let data = tmp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("politifact_no_ignore_enKaDataset.tsv"),
        "id\ttext\tcomments\tentities\tlabel\n7\tsome text\tok<>2\tSenate\t0\n",
    )
    .unwrap();
    std::fs::write(
        data.join("politifact_no_ignore_clm.tsv"),
        "entity\tclaims\nSenate\tvotes||debates\n",
    )
    .unwrap();

    // Default suffix is empty, so the KaDataset file needs the override.
    let err = run_raw_summary(RawSummaryArgs {
        config: config.clone(),
        data_source: "politifact".to_string(),
        overrides: DataOverrides::default(),
        json: false,
    });
    assert!(err.is_err());

    run_raw_summary(RawSummaryArgs {
        config: config.clone(),
        data_source: "politifact".to_string(),
        overrides: DataOverrides {
            suffix: Some("KaDataset".to_string()),
            ..Default::default()
        },
        json: true,
    })
    .unwrap();

    run_claims(ClaimsArgs {
        config: config.clone(),
        data_source: "politifact".to_string(),
        overrides: DataOverrides::default(),
        entity: Some("Senate".to_string()),
    })
    .unwrap();

    let err = run_claims(ClaimsArgs {
        config,
        data_source: "politifact".to_string(),
        overrides: DataOverrides::default(),
        entity: Some("House".to_string()),
    })
    .unwrap_err();
    assert!(err.to_string().contains("House"), "{err}");
}
