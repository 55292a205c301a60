//! Configuration types for card extraction.
//!
//! Follows a builder pattern for complex configuration with validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Depth used when neither a `depth` property nor a depth tag is present.
pub const UNLIMITED_DEPTH: usize = 9999;

/// Property keys the classifier reads from blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyKeys {
    /// Explicit card direction (`->`, `<-`, `<->`)
    pub direction: String,
    /// Maximum children depth
    pub depth: String,
    /// Note model name
    pub model: String,
    /// Extra annotation appended under a child
    pub extra: String,
    /// Ordered-list marker set by the host (`number`)
    pub order_list_type: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self {
            direction: "direction".to_string(),
            depth: "depth".to_string(),
            model: "model".to_string(),
            extra: "extra".to_string(),
            order_list_type: "logseq.order-list-type".to_string(),
        }
    }
}

/// Extraction configuration shared (read-only) by every note of a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Display name of the graph, used in exports
    pub graph_name: String,
    /// Tag marking a block as a multi-line card
    pub card_tag: String,
    /// Tag whose children each become a multi-line card
    pub card_group_tag: String,
    /// Model used when a block has no `model` property
    pub default_model: String,
    /// Children depth used when nothing overrides it
    pub default_depth: usize,
    /// Prefix of field declaration properties (`field-front:: content`)
    pub field_prefix: String,
    pub keys: PropertyKeys,
    /// Run the cloze extractor
    pub cloze_enabled: bool,
    /// Run the swift-arrow extractor
    pub swift_arrow_enabled: bool,
    pub log_level: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            graph_name: "default".to_string(),
            card_tag: "card".to_string(),
            card_group_tag: "card-group".to_string(),
            default_model: "Basic".to_string(),
            default_depth: UNLIMITED_DEPTH,
            field_prefix: "field-".to_string(),
            keys: PropertyKeys::default(),
            cloze_enabled: true,
            swift_arrow_enabled: true,
            log_level: "INFO".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Create new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config with builder
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.card_tag.trim().is_empty() {
            return Err(Error::config_error("Card tag cannot be empty"));
        }

        if self.card_group_tag.trim().is_empty() {
            return Err(Error::config_error("Card group tag cannot be empty"));
        }

        if self.card_tag.eq_ignore_ascii_case(&self.card_group_tag) {
            return Err(Error::config_error(
                "Card tag and card group tag must differ",
            ));
        }

        if self.default_model.trim().is_empty() {
            return Err(Error::config_error("Default model cannot be empty"));
        }

        if self.default_depth == 0 {
            return Err(Error::config_error("Default depth must be positive"));
        }

        if self.field_prefix.is_empty() {
            return Err(Error::config_error("Field prefix cannot be empty"));
        }

        Ok(())
    }

    /// Save configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, yaml).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to save config to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load configuration from a YAML file. Missing keys take their defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to load config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid configuration: {}", e)))?;

        config.validate()?;
        log::debug!("Loaded extraction config from {}", path.display());
        Ok(config)
    }
}

/// Builder for ExtractionConfig
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
        }
    }

    pub fn graph_name(mut self, name: impl Into<String>) -> Self {
        self.config.graph_name = name.into();
        self
    }

    pub fn card_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.card_tag = tag.into();
        self
    }

    pub fn card_group_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.card_group_tag = tag.into();
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    pub fn default_depth(mut self, depth: usize) -> Self {
        self.config.default_depth = depth;
        self
    }

    pub fn field_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.field_prefix = prefix.into();
        self
    }

    pub fn cloze_enabled(mut self, enabled: bool) -> Self {
        self.config.cloze_enabled = enabled;
        self
    }

    pub fn swift_arrow_enabled(mut self, enabled: bool) -> Self {
        self.config.swift_arrow_enabled = enabled;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<ExtractionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ExtractionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_builder() {
        let config = ExtractionConfig::builder()
            .graph_name("notes")
            .default_model("Basic (and reversed card)")
            .default_depth(3)
            .build()
            .unwrap();

        assert_eq!(config.graph_name, "notes");
        assert_eq!(config.default_depth, 3);
        assert_eq!(config.keys.direction, "direction");
    }

    #[test]
    fn test_config_validation() {
        assert!(ExtractionConfig::builder().default_depth(0).build().is_err());
        assert!(ExtractionConfig::builder().card_tag("").build().is_err());
        assert!(
            ExtractionConfig::builder()
                .card_tag("Card")
                .card_group_tag("card")
                .build()
                .is_err()
        );
        assert!(ExtractionConfig::builder().field_prefix("").build().is_err());
    }

    #[tokio::test]
    async fn test_config_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blockcards.yaml");

        let config = ExtractionConfig::builder()
            .card_tag("flashcard")
            .cloze_enabled(false)
            .build()
            .unwrap();
        config.save(&path).await.unwrap();

        let loaded = ExtractionConfig::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.yaml");
        tokio::fs::write(&path, "default_model: Cloze\nkeys:\n  extra: note\n")
            .await
            .unwrap();

        let loaded = ExtractionConfig::load(&path).await.unwrap();
        assert_eq!(loaded.default_model, "Cloze");
        assert_eq!(loaded.keys.extra, "note");
        assert_eq!(loaded.keys.depth, "depth");
        assert_eq!(loaded.card_tag, "card");
    }

    #[tokio::test]
    async fn test_missing_config_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = ExtractionConfig::load(&temp.path().join("nope.yaml")).await;
        assert!(result.is_err());
    }
}
