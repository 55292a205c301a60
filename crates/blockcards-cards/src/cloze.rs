//! Cloze notes: blocks with Anki cloze markers or highlights.

use async_trait::async_trait;
use blockcards_core::prelude::*;
use blockcards_render::{ContentRenderer, strip_properties, strip_tags};
use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};

use crate::note::{Note, marker_tag_names};

/// Content pattern used to discover cloze candidates in the graph
pub const CLOZE_QUERY: &str = r"\{\{c\d+(::|\s)|\^\^.+?\^\^";

/// Explicit cloze number, in either `{{c1::…}}` or `{{c1 …}}` form
static CLOZE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c(\d+)(?:::|\s)").unwrap());

/// Macro form: {{c1 text}}
static CLOZE_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{c(\d+)\s+(.+?)\}\}").unwrap());

static HIGHLIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\^\^(.+?)\^\^").unwrap());

const CLOZE_MODEL: &str = "Cloze";

/// Whether the content carries any cloze marker
pub fn has_cloze(content: &str) -> bool {
    CLOZE_NUMBER.is_match(content) || HIGHLIGHT.is_match(content)
}

/// Normalize macros and highlights into `{{cN::…}}` deletions.
///
/// Highlights are numbered in order, after the highest explicit cloze number.
pub fn convert_clozes(content: &str) -> String {
    let highest = CLOZE_NUMBER
        .captures_iter(content)
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .max()
        .unwrap_or(0);

    let normalized = CLOZE_MACRO.replace_all(content, "{{c${1}::${2}}}");

    let mut next = highest + 1;
    HIGHLIGHT
        .replace_all(&normalized, |caps: &Captures| {
            let cloze = format!("{{{{c{}::{}}}}}", next, &caps[1]);
            next += 1;
            cloze
        })
        .into_owned()
}

#[derive(Debug, Clone)]
pub struct ClozeNote {
    uuid: String,
    content: String,
    format: ContentFormat,
    properties: PropertyMap,
    page: Option<Page>,
    config: Arc<ExtractionConfig>,
}

impl ClozeNote {
    /// Build a note when the block carries cloze markers.
    pub fn from_block(
        block: Block,
        page: Option<Page>,
        config: Arc<ExtractionConfig>,
    ) -> Option<Self> {
        if !has_cloze(&block.content) {
            return None;
        }
        Some(Self {
            uuid: block.uuid,
            content: block.content,
            format: block.format,
            properties: block.properties,
            page,
            config,
        })
    }

    fn model(&self) -> String {
        self.properties
            .get_text(&self.config.keys.model)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| CLOZE_MODEL.to_string())
    }
}

#[async_trait]
impl Note for ClozeNote {
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
        NoteType::Cloze
    }

    async fn build_card(&self, renderer: &dyn ContentRenderer) -> Result<CardPayload> {
        let markup = convert_clozes(&strip_tags(
            &strip_properties(&self.content),
            &marker_tag_names(&self.config),
        ));
        let rendered = renderer.render(&markup, self.format).await?;

        Ok(CardPayload {
            uuid: self.uuid.clone(),
            note_type: NoteType::Cloze,
            model: self.model(),
            fields: vec![CardField::new("Text", rendered.html.clone())],
            html: rendered.html,
            assets: rendered.assets,
            tags: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockcards_render::MarkdownRenderer;

    #[test]
    fn test_highlights_follow_explicit_numbers() {
        assert_eq!(
            convert_clozes("{{c1::Paris}} is the capital of ^^France^^"),
            "{{c1::Paris}} is the capital of {{c2::France}}"
        );
        assert_eq!(
            convert_clozes("{{c2 Rome}} and ^^Italy^^ and ^^Europe^^"),
            "{{c2::Rome}} and {{c3::Italy}} and {{c4::Europe}}"
        );
        assert_eq!(convert_clozes("^^one^^ ^^two^^"), "{{c1::one}} {{c2::two}}");
    }

    #[test]
    fn test_has_cloze() {
        assert!(has_cloze("{{c1::x}}"));
        assert!(has_cloze("{{c3 x}}"));
        assert!(has_cloze("^^x^^"));
        assert!(!has_cloze("{{embed [[page]]}}"));
        assert!(!has_cloze("plain text"));
    }

    #[test]
    fn test_query_pattern_agrees_with_detection() {
        let query = Regex::new(CLOZE_QUERY).unwrap();
        for sample in ["{{c1::x}}", "{{c3 x}}", "^^x^^", "plain", "{{query x}}"] {
            assert_eq!(query.is_match(sample), has_cloze(sample), "{}", sample);
        }
    }

    #[tokio::test]
    async fn test_build_card() {
        let block = Block::new(7, "c", "^^Paris^^ is in France #card\nid:: 7");
        let note =
            ClozeNote::from_block(block, None, Arc::new(ExtractionConfig::default())).unwrap();
        let card = note.build_card(&MarkdownRenderer::new()).await.unwrap();

        assert_eq!(card.note_type, NoteType::Cloze);
        assert_eq!(card.model, "Cloze");
        assert_eq!(card.fields.len(), 1);
        assert_eq!(card.field("Text"), Some("<p>{{c1::Paris}} is in France</p>\n"));
    }

    #[test]
    fn test_plain_block_is_not_a_cloze() {
        let block = Block::new(7, "c", "Nothing to hide");
        assert!(
            ClozeNote::from_block(block, None, Arc::new(ExtractionConfig::default())).is_none()
        );
    }
}
