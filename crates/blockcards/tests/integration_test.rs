//! Integration tests for the blockcards pipeline

use blockcards::{ExportBundle, ExportFormat, PipelineOptions, load_config, run};
use blockcards::{ExtractionConfig, NoteType};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

const SNAPSHOT: &str = r#"{
  "name": "study",
  "pages": [
    { "id": 1, "name": "card" },
    { "id": 2, "name": "reversed" },
    { "id": 3, "name": "Geography" }
  ],
  "blocks": [
    {
      "id": 10,
      "uuid": "q1",
      "content": "What is the capital of France? #card",
      "refs": [1],
      "page": 3,
      "children": [
        { "id": 11, "uuid": "q1-a", "content": "Paris" }
      ]
    },
    {
      "id": 20,
      "uuid": "q2",
      "content": "Largest ocean #card #reversed\ndirection:: <-",
      "properties": { "direction": "<-" },
      "refs": [1, 2],
      "children": [
        { "id": 21, "uuid": "q2-a", "content": "Pacific" }
      ]
    },
    {
      "id": 30,
      "uuid": "c1",
      "content": "^^Canberra^^ is the capital of Australia #card",
      "refs": [1]
    },
    {
      "id": 40,
      "uuid": "s1",
      "content": "Capital of Japan >> Tokyo"
    }
  ]
}"#;

/// Helper to write a snapshot into a temp dir
async fn write_snapshot(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("graph.json");
    fs::write(&path, contents)
        .await
        .expect("Failed to write snapshot");
    path
}

#[tokio::test]
async fn test_json_export() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let graph = write_snapshot(temp.path(), SNAPSHOT).await;

    let output = run(&PipelineOptions::new(graph, ExtractionConfig::default()))
        .await
        .expect("Pipeline failed");

    let bundle: ExportBundle =
        serde_json::from_str(&output.rendered).expect("Export is not a bundle");
    assert_eq!(bundle.graph_name, "study");
    assert_eq!(bundle.card_count, 4);
    assert_eq!(output.report.filtered, 1);
    assert_eq!(output.report.dropped, 0);

    let kinds: Vec<(&str, NoteType)> = bundle
        .cards
        .iter()
        .map(|c| (c.uuid.as_str(), c.note_type))
        .collect();
    assert!(kinds.contains(&("q1", NoteType::Multiline)));
    assert!(kinds.contains(&("q2", NoteType::Multiline)));
    assert!(kinds.contains(&("c1", NoteType::Cloze)));
    assert!(kinds.contains(&("s1", NoteType::SwiftArrow)));
    assert!(!kinds.contains(&("c1", NoteType::Multiline)));
}

#[tokio::test]
async fn test_csv_export_to_file() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let graph = write_snapshot(temp.path(), SNAPSHOT).await;
    let out = temp.path().join("cards.csv");

    let options = PipelineOptions::new(graph, ExtractionConfig::default())
        .with_format(ExportFormat::Csv)
        .with_output(&out);
    let output = run(&options).await.expect("Pipeline failed");

    let written = fs::read_to_string(&out).await.expect("Output not written");
    assert_eq!(written, output.rendered);
    assert!(written.starts_with("uuid,note_type,model,fields\n"));
    assert!(written.contains("\nq1,multiline_card,Basic,"));
    assert!(written.contains("\ns1,swift_arrow,Basic,"));
}

#[tokio::test]
async fn test_config_file_disables_extractors() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let graph = write_snapshot(temp.path(), SNAPSHOT).await;
    let config_path = temp.path().join("blockcards.yaml");
    fs::write(&config_path, "cloze_enabled: false\nswift_arrow_enabled: false\n")
        .await
        .expect("Failed to write config");

    let config = load_config(Some(&config_path)).await.expect("Config rejected");
    assert_eq!(config.card_tag, "card");

    let output = run(&PipelineOptions::new(graph, config))
        .await
        .expect("Pipeline failed");

    assert_eq!(output.report.cards.len(), 3);
    assert!(
        output
            .report
            .cards
            .iter()
            .all(|c| c.note_type == NoteType::Multiline)
    );
}

#[tokio::test]
async fn test_missing_snapshot_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let options =
        PipelineOptions::new(temp.path().join("absent.json"), ExtractionConfig::default());
    assert!(run(&options).await.is_err());
}

#[tokio::test]
async fn test_malformed_snapshot_fails() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let graph = write_snapshot(temp.path(), "{ not json").await;
    assert!(
        run(&PipelineOptions::new(graph, ExtractionConfig::default()))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp.path().join("bad.yaml");
    fs::write(&config_path, "card_tag: ''\n")
        .await
        .expect("Failed to write config");

    assert!(load_config(Some(&config_path)).await.is_err());
}

#[tokio::test]
async fn test_unnamed_graph_uses_configured_name() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let graph = write_snapshot(temp.path(), r#"{ "name": "", "pages": [], "blocks": [] }"#).await;

    let mut config = ExtractionConfig::default();
    config.graph_name = "fallback".to_string();
    let output = run(&PipelineOptions::new(graph, config))
        .await
        .expect("Pipeline failed");

    let bundle: ExportBundle = serde_json::from_str(&output.rendered).unwrap();
    assert_eq!(bundle.graph_name, "fallback");
    assert!(bundle.cards.is_empty());
}
