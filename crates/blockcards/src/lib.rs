//! # Blockcards
//!
//! The extraction pipeline behind the `blockcards` CLI: load a graph snapshot,
//! make sure the tag vocabulary exists, synthesize cards and export them.

use blockcards_cards::{ExtractionReport, Extractor};
use blockcards_graph::InMemoryGraph;
use blockcards_render::MarkdownRenderer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

pub use blockcards_cards::prelude::*;
pub use blockcards_export::{CardExporter, ExportBundle, ExportFormat, create_export_bundle};

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| Error::config_error(format!("Cannot expand path '{}': {}", raw, e)))
}

/// Inputs of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub graph_path: PathBuf,
    pub config: ExtractionConfig,
    pub format: ExportFormat,
    /// Write the export here instead of returning it only
    pub output: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn new(graph_path: impl Into<PathBuf>, config: ExtractionConfig) -> Self {
        Self {
            graph_path: graph_path.into(),
            config,
            format: ExportFormat::default(),
            output: None,
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// What a pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: ExtractionReport,
    /// Serialized export in the requested format
    pub rendered: String,
}

/// Load the config file when given, defaults otherwise
pub async fn load_config(path: Option<&Path>) -> Result<ExtractionConfig> {
    match path {
        Some(path) => ExtractionConfig::load(path).await,
        None => Ok(ExtractionConfig::default()),
    }
}

/// Run a full extraction and export.
#[instrument(skip_all, fields(graph = %options.graph_path.display()), name = "pipeline")]
pub async fn run(options: &PipelineOptions) -> Result<PipelineOutput> {
    options.config.validate()?;

    let graph = Arc::new(InMemoryGraph::load(&options.graph_path).await?);
    let graph_name = if graph.name().trim().is_empty() {
        options.config.graph_name.clone()
    } else {
        graph.name().to_string()
    };

    let extractor = Extractor::new(
        graph,
        Arc::new(MarkdownRenderer::new()),
        options.config.clone(),
    );
    extractor.ensure_vocabulary().await?;
    let report = extractor.extract_cards().await?;

    let bundle = create_export_bundle(&graph_name, report.cards.clone());
    let rendered = CardExporter::export(&bundle, options.format)?;

    if let Some(output) = &options.output {
        tokio::fs::write(output, &rendered).await.map_err(|e| {
            Error::other(format!("Failed to write {}: {}", output.display(), e))
        })?;
        log::info!(
            "Wrote {} cards as {} to {}",
            bundle.card_count,
            options.format,
            output.display()
        );
    }

    Ok(PipelineOutput { report, rendered })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_undefined_variable() {
        let err = expand_path("$BLOCKCARDS_TEST_UNDEFINED_DIR/graph.json").unwrap_err();
        assert!(matches!(err, Error::ConfigError { .. }));
    }

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("/tmp/g.json").unwrap(), PathBuf::from("/tmp/g.json"));
    }

    #[tokio::test]
    async fn test_load_config_defaults() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config, ExtractionConfig::default());
    }
}
