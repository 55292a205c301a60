//! Swift-arrow notes: single-line `front >> back` cards.

use async_trait::async_trait;
use blockcards_core::prelude::*;
use blockcards_render::{ContentRenderer, strip_properties, strip_tags};
use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::note::{Note, marker_tag_names};

/// Content pattern used to discover swift-arrow candidates in the graph
pub const SWIFT_ARROW_QUERY: &str = r"\s(>>|<<|<>)\s";

static SWIFT_ARROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+(>>|<<|<>)\s+(.+)$").unwrap());

const BASIC_MODEL: &str = "Basic";
const REVERSED_MODEL: &str = "Basic (and reversed card)";

/// Split a single line into `(front, direction, back)`.
pub fn parse_swift_arrow(line: &str) -> Option<(String, Direction, String)> {
    let caps = SWIFT_ARROW.captures(line.trim())?;
    let direction = match &caps[2] {
        ">>" => Direction::Forward,
        "<<" => Direction::Reverse,
        _ => Direction::Bidirectional,
    };
    Some((caps[1].trim().to_string(), direction, caps[3].trim().to_string()))
}

#[derive(Debug, Clone)]
pub struct SwiftArrowNote {
    uuid: String,
    content: String,
    format: ContentFormat,
    properties: PropertyMap,
    page: Option<Page>,
    front: String,
    back: String,
    direction: Direction,
}

impl SwiftArrowNote {
    /// Build a note when the block (minus properties and card tags) is a single arrow line.
    pub fn from_block(block: Block, page: Option<Page>, config: &ExtractionConfig) -> Option<Self> {
        let text = strip_tags(&strip_properties(&block.content), &marker_tag_names(config));
        if text.contains('\n') {
            return None;
        }
        let (front, direction, back) = parse_swift_arrow(&text)?;
        Some(Self {
            uuid: block.uuid,
            content: block.content,
            format: block.format,
            properties: block.properties,
            page,
            front,
            back,
            direction,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

#[async_trait]
impl Note for SwiftArrowNote {
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
        NoteType::SwiftArrow
    }

    async fn build_card(&self, renderer: &dyn ContentRenderer) -> Result<CardPayload> {
        let (front, back) = futures::try_join!(
            renderer.render(&self.front, self.format),
            renderer.render(&self.back, self.format)
        )?;

        let (model, front, back) = match self.direction {
            Direction::Forward => (BASIC_MODEL, front, back),
            Direction::Reverse => (BASIC_MODEL, back, front),
            Direction::Bidirectional => (REVERSED_MODEL, front, back),
        };

        let mut assets = front.assets;
        assets.extend(back.assets);

        Ok(CardPayload {
            uuid: self.uuid.clone(),
            note_type: NoteType::SwiftArrow,
            model: model.to_string(),
            fields: vec![
                CardField::new("Front", front.html.clone()),
                CardField::new("Back", back.html),
            ],
            html: front.html,
            assets,
            tags: Vec::new(),
        })
    }
}
