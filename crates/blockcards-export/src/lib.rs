//! # Card Export
//!
//! Serializes synthesized cards for downstream import, as pretty JSON or CSV.
//!
//! ## Quick Start
//!
//! ```
//! use blockcards_core::prelude::*;
//! use blockcards_export::{CardExporter, create_export_bundle};
//!
//! # fn example() -> Result<()> {
//! let card = CardPayload {
//!     uuid: "q".to_string(),
//!     note_type: NoteType::Multiline,
//!     model: "Basic".to_string(),
//!     fields: vec![
//!         CardField::new("Front", "<p>Question?</p>"),
//!         CardField::new("Back", "<p>Answer</p>"),
//!     ],
//!     html: "<p>Question?</p>".to_string(),
//!     assets: Default::default(),
//!     tags: Vec::new(),
//! };
//!
//! let bundle = create_export_bundle("my-graph", vec![card]);
//! let json = CardExporter::to_json(&bundle)?;
//! assert!(json.contains("my-graph"));
//!
//! let csv = CardExporter::to_csv(&bundle.cards)?;
//! assert!(csv.starts_with("uuid,note_type,model,fields\n"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Export Formats
//!
//! ### JSON Export
//! - Pretty-printed
//! - The whole [`ExportBundle`], cards in extraction order
//!
//! ### CSV Export
//! - Header row, then one row per card
//! - Fields flattened to `name=html` pairs joined with `|`
//! - Cells with separators or quotes are quoted, inner quotes doubled

use blockcards_core::prelude::*;
use blockcards_core::{CSVBuilder, to_json_string};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format (pretty-printed bundle)
    #[default]
    Json,
    /// CSV format (one row per card)
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

/// Cards of one extraction pass, stamped for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportBundle {
    pub export_id: String,
    pub timestamp: String,
    pub graph_name: String,
    pub card_count: usize,
    pub cards: Vec<CardPayload>,
}

/// Card exporter
pub struct CardExporter;

impl CardExporter {
    /// Export a bundle as JSON
    pub fn to_json(bundle: &ExportBundle) -> Result<String> {
        to_json_string(bundle, "card bundle")
    }

    /// Export cards as CSV
    pub fn to_csv(cards: &[CardPayload]) -> Result<String> {
        let csv = cards
            .iter()
            .fold(
                CSVBuilder::new(vec!["uuid", "note_type", "model", "fields"]),
                |csv, card| {
                    let fields = card
                        .fields
                        .iter()
                        .map(|f| format!("{}={}", f.name, f.html))
                        .collect::<Vec<_>>()
                        .join("|");
                    csv.add_row_owned(vec![
                        card.uuid.clone(),
                        card.note_type.to_string(),
                        card.model.clone(),
                        fields,
                    ])
                },
            )
            .build();

        Ok(csv)
    }

    pub fn export(bundle: &ExportBundle, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Self::to_json(bundle),
            ExportFormat::Csv => Self::to_csv(&bundle.cards),
        }
    }
}

/// Wrap cards into a bundle stamped with the current time
pub fn create_export_bundle(graph_name: &str, cards: Vec<CardPayload>) -> ExportBundle {
    ExportBundle {
        export_id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now().to_rfc3339(),
        graph_name: graph_name.to_string(),
        card_count: cards.len(),
        cards,
    }
}
