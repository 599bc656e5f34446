use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fakenews_core::config::DataOverrides;
use fakenews_core::pipeline::{
    self, BundleSummaryArgs, CheckArgs, ClaimsArgs, RawSummaryArgs,
};

/// fakenews: inspect multimodal fake-news corpora and preprocessed bundles.
#[derive(Parser)]
#[command(name = "fakenews", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
struct DataArgs {
    /// Path to data config TOML file.
    #[arg(long, default_value = "configs/data.toml")]
    config: PathBuf,
    /// Data source name (e.g., politifact, gossipcop).
    #[arg(long)]
    data_source: String,
    /// Override the data directory from the config.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Override the image backbone (vgg19, resnet50).
    #[arg(long)]
    backbone: Option<String>,
    /// Keep only articles with a non-zero image representation.
    #[arg(long)]
    exclude_with_no_image: bool,
    /// Read the KAHAN bundle.
    #[arg(long)]
    kahan: bool,
    /// Reshape image features into IHAN sentences.
    #[arg(long)]
    use_ihan: bool,
    /// Read the CLIP entity bundle.
    #[arg(long)]
    use_clip: bool,
}

impl DataArgs {
    /// Flags left unset keep the TOML value.
    fn overrides(&self, suffix: Option<String>) -> DataOverrides {
        DataOverrides {
            data_dir: self.data_dir.clone(),
            suffix,
            backbone: self.backbone.clone(),
            exclude_with_no_image: self.exclude_with_no_image.then_some(true),
            kahan: self.kahan.then_some(true),
            use_ihan: self.use_ihan.then_some(true),
            use_clip: self.use_clip.then_some(true),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print counts over a raw TSV corpus.
    RawSummary {
        #[command(flatten)]
        data: DataArgs,
        /// Override the records TSV suffix (e.g., KaDataset).
        #[arg(long)]
        suffix: Option<String>,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
    /// List entity claims.
    Claims {
        #[command(flatten)]
        data: DataArgs,
        /// Print the claims of one entity.
        #[arg(long)]
        entity: Option<String>,
    },
    /// Print statistics from the selected preprocessed bundle.
    BundleSummary {
        #[command(flatten)]
        data: DataArgs,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
    /// Load the dataset as training would and print feature shapes.
    Check {
        #[command(flatten)]
        data: DataArgs,
        /// Number of items collated into the sample batch.
        #[arg(long, default_value_t = 4)]
        batch_size: usize,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::RawSummary { data, suffix, json } => {
            pipeline::run_raw_summary(RawSummaryArgs {
                overrides: data.overrides(suffix),
                config: data.config,
                data_source: data.data_source,
                json,
            })
        }
        Command::Claims { data, entity } => pipeline::run_claims(ClaimsArgs {
            overrides: data.overrides(None),
            config: data.config,
            data_source: data.data_source,
            entity,
        }),
        Command::BundleSummary { data, json } => {
            pipeline::run_bundle_summary(BundleSummaryArgs {
                overrides: data.overrides(None),
                config: data.config,
                data_source: data.data_source,
                json,
            })
        }
        Command::Check {
            data,
            batch_size,
            json,
        } => pipeline::run_check(CheckArgs {
            overrides: data.overrides(None),
            config: data.config,
            data_source: data.data_source,
            batch_size,
            json,
        }),
    }
}
