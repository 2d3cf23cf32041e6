//! Screening CLI
//!
//! Screens a local spreadsheet or text file against a reference file and
//! prints the same JSON body the upload endpoint returns.
//!
//! # Usage
//!
//! ```bash
//! screen_cli --reference data/reference_data.json --sheet transactions.csv
//! screen_cli --reference data/reference_data.json --text memo.txt --granularity cell
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use serde_json::json;

use aml_screen::ingest::{decode_text, parse_spreadsheet};
use aml_screen::pipeline::SUCCESS_MESSAGE;
use aml_screen::reference::load_reference_data;
use aml_screen::{
    default_embedder, Granularity, PatternRecognizer, ScreeningConfig, ScreeningInput, ScreeningPipeline,
    StaticWatchlistSource,
};

#[derive(Parser, Debug)]
#[command(name = "screen_cli")]
#[command(about = "Screen a transaction spreadsheet or text document against watchlists")]
struct Cli {
    /// Reference watchlist JSON
    #[arg(long, short = 'r', env = "SCREENING_REFERENCE_PATH")]
    reference: PathBuf,

    /// Spreadsheet to screen (xlsx, xls, ods or CSV)
    #[arg(long, short = 's', conflicts_with = "text")]
    sheet: Option<PathBuf>,

    /// Text document to screen
    #[arg(long, short = 't')]
    text: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the configured granularity
    #[arg(long, short = 'g', value_enum)]
    granularity: Option<GranularityArg>,

    /// Fill empty reference categories from the built-in lists
    #[arg(long)]
    fallback: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GranularityArg {
    Row,
    Cell,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Row => Granularity::Row,
            GranularityArg::Cell => Granularity::Cell,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aml_screen=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ScreeningConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScreeningConfig::default(),
    };

    let input = match (&cli.sheet, &cli.text) {
        (Some(path), _) => {
            let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            ScreeningInput::Spreadsheet(parse_spreadsheet(&bytes)?)
        }
        (None, Some(path)) => {
            let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            ScreeningInput::Document {
                text: decode_text(&bytes)?,
                name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            }
        }
        (None, None) => bail!("one of --sheet or --text is required"),
    };

    let mut reference = load_reference_data(&cli.reference);
    if cli.fallback || config.reference.fill_empty_from_fallback {
        reference.fill_empty_from(&StaticWatchlistSource);
    }

    let mut pipeline = ScreeningPipeline::new(default_embedder()?, Arc::new(PatternRecognizer::new()), &config);
    if let Some(granularity) = cli.granularity {
        pipeline = pipeline.with_granularity(granularity.into());
    }

    let results = pipeline.screen(&[input], &reference);
    let body = json!({
        "message": SUCCESS_MESSAGE,
        "results": results,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
