//! Multi-line cards: a tagged block whose children form the answer.

use async_trait::async_trait;
use blockcards_core::prelude::*;
use blockcards_render::{ContentRenderer, escape_html, strip_properties, strip_tags};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::note::{Note, marker_tag_names};
use crate::outline::render_children;

/// Mapping that resolves to the rendered block content
pub const CONTENT_MAPPING: &str = "content";
/// Mapping that resolves to the rendered children outline
pub const CHILDREN_MAPPING: &str = "children";

/// A block tagged as a card (directly, via an alias, or through a card group).
#[derive(Debug, Clone)]
pub struct MultilineCardNote {
    uuid: String,
    content: String,
    format: ContentFormat,
    properties: PropertyMap,
    page: Option<Page>,
    children: Vec<Block>,
    tags: Vec<CardTag>,
    config: Arc<ExtractionConfig>,
}

impl MultilineCardNote {
    /// Build from a block fetched with its children and its classified tags.
    pub fn new(
        block: Block,
        page: Option<Page>,
        tags: Vec<CardTag>,
        config: Arc<ExtractionConfig>,
    ) -> Self {
        Self {
            uuid: block.uuid,
            content: block.content,
            format: block.format,
            properties: block.properties,
            page,
            children: block.children,
            tags,
            config,
        }
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn tags(&self) -> &[CardTag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: CardTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Non-empty `direction` property, whatever its value
    pub fn explicit_direction(&self) -> Option<String> {
        self.properties
            .get_text(&self.config.keys.direction)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    }

    /// Card direction: a valid `direction` property wins, then direction tags.
    pub fn direction(&self) -> Direction {
        if let Some(direction) = self
            .explicit_direction()
            .as_deref()
            .and_then(Direction::from_arrow)
        {
            return direction;
        }

        let forward = self.has_tag(CardTag::Forward);
        let reversed = self.has_tag(CardTag::Reversed);
        if (forward && reversed) || self.has_tag(CardTag::Bidirectional) {
            Direction::Bidirectional
        } else if reversed {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Children depth cap. Depth tags override the `depth` property; the last one wins.
    pub fn max_depth(&self) -> usize {
        let depth_tags: Vec<usize> = self
            .tags
            .iter()
            .filter_map(|tag| match tag {
                CardTag::Depth(n) => Some(*n),
                _ => None,
            })
            .collect();

        if depth_tags.len() > 1 {
            log::debug!(
                "Block {} carries {} depth tags, using the last one",
                self.uuid,
                depth_tags.len()
            );
        }

        depth_tags.last().copied().unwrap_or_else(|| {
            self.properties
                .get_positive_int(&self.config.keys.depth)
                .unwrap_or(self.config.default_depth)
        })
    }

    pub fn model(&self) -> String {
        self.properties
            .get_text(&self.config.keys.model)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.config.default_model.clone())
    }

    /// Declared `(field name, mapping)` pairs, in property order
    pub fn field_declarations(&self) -> Vec<(String, String)> {
        self.properties
            .with_prefix(&self.config.field_prefix)
            .map(|(name, value)| (name.to_string(), value.to_text()))
            .collect()
    }

    /// Resolve a field mapping to HTML.
    ///
    /// `content` and `children` render the block; any other mapping reads the
    /// named property, yielding `""` when it is absent.
    pub async fn resolve_field(
        &self,
        mapping: &str,
        renderer: &dyn ContentRenderer,
    ) -> Result<String> {
        match mapping.trim() {
            CONTENT_MAPPING => self.render_content(renderer).await,
            CHILDREN_MAPPING => Ok(render_children(
                &self.children,
                self.max_depth(),
                &self.config.keys,
                renderer,
            )
            .await?
            .html),
            other => Ok(self.properties.get_text(other).unwrap_or_default()),
        }
    }

    async fn resolve_cached(
        &self,
        mapping: &str,
        renderer: &dyn ContentRenderer,
        cache: &mut HashMap<String, String>,
    ) -> Result<String> {
        if let Some(html) = cache.get(mapping) {
            return Ok(html.clone());
        }
        let html = self.resolve_field(mapping, renderer).await?;
        cache.insert(mapping.to_string(), html.clone());
        Ok(html)
    }

    async fn render_content(&self, renderer: &dyn ContentRenderer) -> Result<String> {
        let markup = strip_tags(
            &strip_properties(&self.content),
            &marker_tag_names(&self.config),
        );
        Ok(renderer.render(&markup, self.format).await?.html)
    }

    fn metadata(&self, model: &str, direction: Direction, fields: &[CardField]) -> Result<String> {
        let fields: Map<String, Value> = fields
            .iter()
            .map(|f| (f.name.clone(), Value::String(f.html.clone())))
            .collect();
        let meta = serde_json::json!({
            "model": model,
            "direction": direction,
            "fields": fields,
        });
        let json = serde_json::to_string(&meta)
            .map_err(|e| Error::parse_error(format!("card metadata for {}: {}", self.uuid, e)))?;
        Ok(format!(
            "<div class=\"card-meta\" hidden>{}</div>",
            escape_html(&json)
        ))
    }
}

#[async_trait]
impl Note for MultilineCardNote {
    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn format(&self) -> ContentFormat {
        self.format
    }

    fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    fn note_type(&self) -> NoteType {
        NoteType::Multiline
    }

    async fn build_card(&self, renderer: &dyn ContentRenderer) -> Result<CardPayload> {
        let mut cache = HashMap::new();
        let direction = self.direction();
        let model = self.model();

        let mut fields = Vec::new();
        for (name, mapping) in self.field_declarations() {
            let html = self.resolve_cached(&mapping, renderer, &mut cache).await?;
            fields.push(CardField::new(name, html));
        }

        let main_mapping = if direction.leads_with_children() {
            CHILDREN_MAPPING
        } else {
            CONTENT_MAPPING
        };
        let main_content = self.resolve_cached(main_mapping, renderer, &mut cache).await?;

        if fields.is_empty() {
            if model.to_lowercase().contains("cloze") {
                fields.push(CardField::new("Text", main_content.clone()));
            } else {
                let back = self
                    .resolve_cached(CHILDREN_MAPPING, renderer, &mut cache)
                    .await?;
                fields.push(CardField::new("Front", main_content.clone()));
                fields.push(CardField::new("Back", back));
            }
        }

        let html = format!(
            "{}\n{}",
            self.metadata(&model, direction, &fields)?,
            main_content
        );

        Ok(CardPayload {
            uuid: self.uuid.clone(),
            note_type: NoteType::Multiline,
            model,
            fields,
            html,
            assets: Default::default(),
            tags: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcards_render::MarkdownRenderer;

    fn config() -> Arc<ExtractionConfig> {
        Arc::new(ExtractionConfig::default())
    }

    fn note(block: Block, tags: Vec<CardTag>) -> MultilineCardNote {
        MultilineCardNote::new(block, None, tags, config())
    }

    fn qa() -> Block {
        Block::new(1, "q", "Question? #card")
            .with_child(Block::new(2, "a", "Answer"))
    }

    #[test]
    fn test_direction_defaults_forward() {
        assert_eq!(note(qa(), vec![]).direction(), Direction::Forward);
    }

    #[test]
    fn test_direction_from_tags() {
        assert_eq!(note(qa(), vec![CardTag::Reversed]).direction(), Direction::Reverse);
        assert_eq!(
            note(qa(), vec![CardTag::Forward, CardTag::Reversed]).direction(),
            Direction::Bidirectional
        );
        assert_eq!(
            note(qa(), vec![CardTag::Bidirectional]).direction(),
            Direction::Bidirectional
        );
        assert_eq!(note(qa(), vec![CardTag::Forward]).direction(), Direction::Forward);
    }

    #[test]
    fn test_direction_property_wins() {
        let block = qa().with_property("direction", "->");
        assert_eq!(
            note(block, vec![CardTag::Reversed]).direction(),
            Direction::Forward
        );

        let block = qa().with_property("direction", "sideways");
        let n = note(block, vec![CardTag::Reversed]);
        assert_eq!(n.direction(), Direction::Reverse);
        assert_eq!(n.explicit_direction().as_deref(), Some("sideways"));
    }

    #[test]
    fn test_direction_precedence_table() {
        let tag_sets: Vec<(Vec<CardTag>, Direction)> = vec![
            (vec![], Direction::Forward),
            (vec![CardTag::Forward], Direction::Forward),
            (vec![CardTag::Reversed], Direction::Reverse),
            (vec![CardTag::Forward, CardTag::Reversed], Direction::Bidirectional),
            (vec![CardTag::Bidirectional], Direction::Bidirectional),
        ];
        let arrows = [
            ("->", Direction::Forward),
            ("<-", Direction::Reverse),
            ("<->", Direction::Bidirectional),
        ];

        for (tags, from_tags) in &tag_sets {
            assert_eq!(
                note(qa(), tags.clone()).direction(),
                *from_tags,
                "no property, tags {:?}",
                tags
            );
            for (arrow, expected) in arrows {
                let block = qa().with_property("direction", arrow);
                assert_eq!(
                    note(block, tags.clone()).direction(),
                    expected,
                    "direction {} with tags {:?}",
                    arrow,
                    tags
                );
            }
        }
    }

    #[test]
    fn test_max_depth() {
        assert_eq!(note(qa(), vec![]).max_depth(), UNLIMITED_DEPTH);
        assert_eq!(note(qa().with_property("depth", 3_i64), vec![]).max_depth(), 3);
        assert_eq!(note(qa().with_property("depth", "4"), vec![]).max_depth(), 4);
        assert_eq!(
            note(qa().with_property("depth", 3_i64), vec![CardTag::Depth(2)]).max_depth(),
            2
        );
        assert_eq!(
            note(qa(), vec![CardTag::Depth(5), CardTag::Depth(2)]).max_depth(),
            2
        );
    }

    #[test]
    fn test_model() {
        assert_eq!(note(qa(), vec![]).model(), "Basic");
        assert_eq!(note(qa().with_property("model", "Cloze"), vec![]).model(), "Cloze");
    }

    #[tokio::test]
    async fn test_basic_card_fields() {
        let card = note(qa(), vec![]).build_card(&MarkdownRenderer::new()).await.unwrap();

        assert_eq!(card.note_type, NoteType::Multiline);
        assert_eq!(card.model, "Basic");
        assert_eq!(card.fields.len(), 2);
        assert_eq!(card.field("Front"), Some("<p>Question?</p>\n"));
        assert!(card.field("Back").unwrap().contains("Answer"));
        assert!(card.html.starts_with("<div class=\"card-meta\" hidden>"));
        assert!(card.html.ends_with("<p>Question?</p>\n"));
        assert!(card.html.contains("&quot;direction&quot;:&quot;-&gt;&quot;"));
        assert!(card.assets.is_empty());
        assert!(card.tags.is_empty());
    }

    #[tokio::test]
    async fn test_cloze_model_single_field() {
        let block = qa().with_property("model", "My Cloze");
        let card = note(block, vec![]).build_card(&MarkdownRenderer::new()).await.unwrap();
        assert_eq!(card.fields.len(), 1);
        assert_eq!(card.field("Text"), Some("<p>Question?</p>\n"));
    }

    #[tokio::test]
    async fn test_reverse_card_leads_with_children() {
        let card = note(qa(), vec![CardTag::Reversed])
            .build_card(&MarkdownRenderer::new())
            .await
            .unwrap();
        let front = card.field("Front").unwrap();
        assert!(front.contains("children-list"));
        assert!(front.contains("Answer"));
        assert!(card.html.ends_with(front));
    }

    #[tokio::test]
    async fn test_declared_fields() {
        let block = qa()
            .with_property("field-question", "content")
            .with_property("field-answer", "children")
            .with_property("field-source", "origin")
            .with_property("origin", "Chapter 4");
        let card = note(block, vec![]).build_card(&MarkdownRenderer::new()).await.unwrap();

        assert_eq!(card.fields.len(), 3);
        assert_eq!(card.field("question"), Some("<p>Question?</p>\n"));
        assert!(card.field("answer").unwrap().contains("Answer"));
        assert_eq!(card.field("source"), Some("Chapter 4"));
        assert!(card.field("Front").is_none());
    }

    #[tokio::test]
    async fn test_missing_property_mapping_is_empty() {
        let n = note(qa(), vec![]);
        let html = n.resolve_field("nowhere", &MarkdownRenderer::new()).await.unwrap();
        assert_eq!(html, "");
    }

    #[tokio::test]
    async fn test_content_drops_properties() {
        let block = Block::new(1, "q", "Question? #card\ndirection:: <-\ndepth:: 2");
        let html = note(block, vec![])
            .resolve_field(CONTENT_MAPPING, &MarkdownRenderer::new())
            .await
            .unwrap();
        assert_eq!(html, "<p>Question?</p>\n");
    }
}
