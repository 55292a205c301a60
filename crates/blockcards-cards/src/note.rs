//! The capability set shared by every note variant.

use async_trait::async_trait;
use blockcards_core::prelude::*;
use blockcards_render::ContentRenderer;

/// A block classified as a card source.
///
/// Every variant derived from the same block reports that block's uuid.
#[async_trait]
pub trait Note: Send + Sync {
    fn uuid(&self) -> &str;

    /// Raw block content
    fn content(&self) -> &str;

    fn format(&self) -> ContentFormat;

    fn properties(&self) -> &PropertyMap;

    /// Page containing the source block, when known
    fn page(&self) -> Option<&Page>;

    fn note_type(&self) -> NoteType;

    /// Assemble the renderable card
    async fn build_card(&self, renderer: &dyn ContentRenderer) -> Result<CardPayload>;
}

/// Tag names removed from card content before rendering
pub(crate) fn marker_tag_names(config: &ExtractionConfig) -> Vec<String> {
    let mut names = vec![config.card_tag.clone(), config.card_group_tag.clone()];
    names.extend(CardTag::vocabulary());
    names
}
