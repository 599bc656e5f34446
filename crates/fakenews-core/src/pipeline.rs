//! Subcommand implementations: corpus and bundle inspection.

use std::path::PathBuf;

use burn::backend::ndarray::NdArray;
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;

use newsdata::{
    load_entity_claims, load_preprocessed, load_raw_records, BundleReader, BundleVariant,
    NewsBatcher,
};

use crate::config::{resolve_data_settings, DataOverrides, DataSettings};
use crate::results::{format_shape, BatchShapes, CheckReport, ItemShapes};

type InspectBackend = NdArray<f32>;

/// Arguments for the `raw-summary` subcommand.
#[derive(Debug)]
pub struct RawSummaryArgs {
    pub config: PathBuf,
    pub data_source: String,
    pub overrides: DataOverrides,
    pub json: bool,
}

/// Arguments for the `claims` subcommand.
#[derive(Debug)]
pub struct ClaimsArgs {
    pub config: PathBuf,
    pub data_source: String,
    pub overrides: DataOverrides,
    /// Print only this entity's claims.
    pub entity: Option<String>,
}

/// Arguments for the `bundle-summary` subcommand.
#[derive(Debug)]
pub struct BundleSummaryArgs {
    pub config: PathBuf,
    pub data_source: String,
    pub overrides: DataOverrides,
    pub json: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Debug)]
pub struct CheckArgs {
    pub config: PathBuf,
    pub data_source: String,
    pub overrides: DataOverrides,
    /// Items collated into the sample batch.
    pub batch_size: usize,
    pub json: bool,
}

/// Print counts over the raw TSV corpus of one data source.
pub fn run_raw_summary(args: RawSummaryArgs) -> anyhow::Result<()> {
    let settings = resolve_data_settings(&args.config, &args.overrides)?;
    let corpus = load_raw_records(&settings.data_dir, &args.data_source, &settings.suffix)?;
    let summary = corpus.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("--- Raw Corpus Summary ---");
    println!("Source: {}", args.data_source);
    println!("Records: {}", summary.records);
    println!("Real: {}", summary.real);
    println!("Fake: {}", summary.fake);
    println!("With image: {}", summary.with_image);
    println!("Comments: {}", summary.total_comments);
    if summary.records > 0 {
        let avg = summary.total_comments as f64 / summary.records as f64;
        println!("Avg comments/record: {avg:.2}");
    }
    Ok(())
}

/// Print entity claims, either for one entity or a per-entity count table.
pub fn run_claims(args: ClaimsArgs) -> anyhow::Result<()> {
    let settings = resolve_data_settings(&args.config, &args.overrides)?;
    let claims = load_entity_claims(&settings.data_dir, &args.data_source)?;

    match args.entity {
        Some(entity) => {
            let found = claims
                .get(&entity)
                .ok_or_else(|| anyhow::anyhow!("No claims for entity '{entity}'"))?;
            println!("{entity}:");
            for claim in found {
                println!("  - {claim}");
            }
        }
        None => {
            let mut entities: Vec<_> = claims.iter().collect();
            entities.sort_by(|a, b| a.0.cmp(b.0));
            println!("--- Entity Claims ---");
            println!("Entities: {}", entities.len());
            println!(
                "Claims: {}",
                entities.iter().map(|(_, c)| c.len()).sum::<usize>()
            );
            for (entity, list) in entities {
                println!("{entity}\t{}", list.len());
            }
        }
    }
    Ok(())
}

/// Print statistics from the bundle selected by the load options.
pub fn run_bundle_summary(args: BundleSummaryArgs) -> anyhow::Result<()> {
    let settings = resolve_data_settings(&args.config, &args.overrides)?;
    let variant = BundleVariant::select(&settings.options);
    let path = variant.path(&settings.data_dir, &args.data_source);
    let summary = BundleReader::read_summary(&path)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("--- Bundle Summary ---");
    println!("File: {}", path.display());
    println!("Variant: {variant}");
    println!("Samples: {}", summary.samples);
    for (label, count) in &summary.labels {
        println!("Label {label}: {count}");
    }
    println!("With image: {}", summary.with_image);
    match &summary.image_shape {
        Some(shape) => println!("Image shape: {}", format_shape(shape)),
        None => println!("Image shape: -"),
    }
    println!("Max sentences: {}", summary.max_sentences);
    println!("Max comments: {}", summary.max_comments);
    println!("Max entities: {}", summary.max_entities);
    Ok(())
}

/// Load the dataset exactly as training would and collate a first batch.
pub fn check_dataset(
    settings: &DataSettings,
    data_source: &str,
    batch_size: usize,
) -> anyhow::Result<CheckReport> {
    let variant = BundleVariant::select(&settings.options);
    let path = variant.path(&settings.data_dir, data_source);
    let dataset = load_preprocessed(&settings.data_dir, data_source, &settings.options)?;

    let first_item = dataset.get(0).map(|item| ItemShapes::from_item(&item));
    let first_batch = if dataset.is_empty() {
        None
    } else {
        let items: Vec<_> = (0..batch_size.max(1).min(dataset.len()))
            .filter_map(|i| dataset.get(i))
            .collect();
        let batcher = NewsBatcher::<InspectBackend>::new(Default::default());
        Some(BatchShapes::from_batch(&batcher.batch(items)))
    };

    Ok(CheckReport {
        bundle: path.display().to_string(),
        variant: variant.to_string(),
        samples: dataset.len(),
        labels: dataset.label_counts(),
        first_item,
        first_batch,
    })
}

/// Print the shapes of the first item and of a padded first batch.
pub fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let settings = resolve_data_settings(&args.config, &args.overrides)?;
    let report = check_dataset(&settings, &args.data_source, args.batch_size)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("--- Dataset Check ---");
    println!("File: {}", report.bundle);
    println!("Samples: {}", report.samples);
    for (label, count) in &report.labels {
        println!("Label {label}: {count}");
    }
    let Some(item) = &report.first_item else {
        println!("Dataset is empty");
        return Ok(());
    };
    println!("First item (label {}):", item.label);
    println!("  content_tokens: {}", format_shape(&item.content_tokens));
    println!(
        "  content_sentence_lengths: {}",
        format_shape(&item.content_sentence_lengths)
    );
    println!("  comment_tokens: {}", format_shape(&item.comment_tokens));
    println!(
        "  comment_sentence_lengths: {}",
        format_shape(&item.comment_sentence_lengths)
    );
    println!("  comment_lengths: {}", format_shape(&item.comment_lengths));
    println!("  entity_tokens: {}", format_shape(&item.entity_tokens));
    println!("  clip_entities: {}", format_shape(&item.clip_entities));
    println!("  clip_claims: {}", format_shape(&item.clip_claims));
    println!("  image: {}", format_shape(&item.image));

    if let Some(batch) = &report.first_batch {
        println!("First batch ({} items):", batch.size);
        println!("  content_tokens: {}", format_shape(&batch.content_tokens));
        println!("  comment_tokens: {}", format_shape(&batch.comment_tokens));
        println!("  entity_tokens: {}", format_shape(&batch.entity_tokens));
        println!("  clip_entities: {}", format_shape(&batch.clip_entities));
        println!("  clip_claims: {}", format_shape(&batch.clip_claims));
        println!("  images: {}", format_shape(&batch.images));
    }
    Ok(())
}
