//! Blockcards CLI

use anyhow::{Context, anyhow};
use blockcards::{ExportFormat, PipelineOptions, expand_path, load_config, run};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Human,
    Json,
}

/// Blockcards - turn tagged outline blocks into flashcards
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the graph snapshot (JSON: name, pages, blocks)
    #[arg(short, long, env = "BLOCKCARDS_GRAPH")]
    graph: String,

    /// Extraction config file (YAML)
    #[arg(short, long, env = "BLOCKCARDS_CONFIG")]
    config: Option<String>,

    /// Export format (json, csv)
    #[arg(short, long, default_value = "json")]
    format: ExportFormat,

    /// Write the export to a file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Log output format on stderr
    #[arg(long, value_enum, default_value = "human")]
    log_format: LogFormat,

    /// Skip the cloze extractor
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_cloze: bool,

    /// Skip the swift-arrow extractor
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_swift_arrow: bool,
}

/// Logs go to stderr so stdout carries only the export.
/// `RUST_LOG` wins over the configured level.
fn init_logging(format: LogFormat, default_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level.to_lowercase()))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Human => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.as_deref().map(expand_path).transpose()?;
    let mut config = load_config(config_path.as_deref())
        .await
        .context("Failed to load extraction config")?;
    if args.no_cloze {
        config.cloze_enabled = false;
    }
    if args.no_swift_arrow {
        config.swift_arrow_enabled = false;
    }

    init_logging(args.log_format, &config.log_level)?;
    log::info!("Blockcards v{}", env!("CARGO_PKG_VERSION"));

    let graph_path = expand_path(&args.graph)?;
    let mut options = PipelineOptions::new(graph_path, config).with_format(args.format);
    if let Some(output) = args.output.as_deref() {
        options = options.with_output(expand_path(output)?);
    }

    let output = run(&options)
        .await
        .with_context(|| format!("Extraction from {} failed", options.graph_path.display()))?;

    if options.output.is_none() {
        println!("{}", output.rendered);
    }

    log::info!(
        "Done: {} cards, {} merged away, {} dropped",
        output.report.cards.len(),
        output.report.filtered,
        output.report.dropped
    );
    Ok(())
}
