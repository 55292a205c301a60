//! Core data models for outline blocks and the cards derived from them.
//!
//! These types are designed to be:
//! - **Serializable**: All types derive Serialize/Deserialize
//! - **Debuggable**: Derive Debug for easy inspection
//! - **Type-Safe**: Enums replace magic strings (directions, card tags, formats)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// Numeric block id assigned by the host graph
pub type BlockId = i64;

/// Numeric page id assigned by the host graph
pub type PageId = i64;

// ============================================================================
// Properties
// ============================================================================

/// A single property value attached to a block (`key:: value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<PropertyValue>),
    Structured(serde_json::Value),
}

impl PropertyValue {
    /// Plain text form used when a property is copied into a card field.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Structured(value) => value.to_string(),
        }
    }

    /// Interpret the value as a strictly positive integer.
    ///
    /// Numbers must be whole; text must parse as an unsigned integer.
    pub fn as_positive_int(&self) -> Option<usize> {
        match self {
            Self::Number(n) if *n >= 1.0 && n.fract() == 0.0 && n.is_finite() => Some(*n as usize),
            Self::Text(s) => s.trim().parse::<usize>().ok().filter(|n| *n > 0),
            _ => None,
        }
    }

    /// Borrow the value if it is plain text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Typed property table of a block or page.
///
/// Keys are kept sorted so iteration (and therefore field declaration order)
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    /// Create an empty property map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    /// Borrow a text property
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    /// Text form of a property, if present
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(PropertyValue::to_text)
    }

    /// Text form of a property, or `default` when absent
    pub fn get_text_or(&self, key: &str, default: &str) -> String {
        self.get_text(key).unwrap_or_else(|| default.to_string())
    }

    /// Positive integer form of a property, if present and valid
    pub fn get_positive_int(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(PropertyValue::as_positive_int)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over properties whose key starts with `prefix`, yielding the key suffix.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a PropertyValue)> + 'a {
        self.0.iter().filter_map(move |(key, value)| {
            key.strip_prefix(prefix)
                .filter(|name| !name.is_empty())
                .map(|name| (name, value))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Blocks and pages
// ============================================================================

/// Markup format of a block's content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Markdown,
    Org,
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Org => f.write_str("org"),
        }
    }
}

impl FromStr for ContentFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "org" => Ok(Self::Org),
            other => Err(Error::parse_error(format!("Unknown content format: {}", other))),
        }
    }
}

/// A node of the host outline.
///
/// Children form a tree (never a graph); the pipeline only reads snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub uuid: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub format: ContentFormat,
    #[serde(default)]
    pub children: Vec<Block>,
    #[serde(default)]
    pub properties: PropertyMap,
    /// Ids of the pages this block references (tags and page links)
    #[serde(default)]
    pub refs: BTreeSet<PageId>,
    #[serde(default)]
    pub parent: Option<BlockId>,
    #[serde(default)]
    pub page: Option<PageId>,
}

impl Block {
    /// Create a markdown block with no children, properties or references
    pub fn new(id: BlockId, uuid: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            uuid: uuid.into(),
            content: content.into(),
            format: ContentFormat::Markdown,
            children: Vec::new(),
            properties: PropertyMap::new(),
            refs: BTreeSet::new(),
            parent: None,
            page: None,
        }
    }

    pub fn with_format(mut self, format: ContentFormat) -> Self {
        self.format = format;
        self
    }

    /// Append a child, wiring its parent id
    pub fn with_child(mut self, mut child: Block) -> Self {
        child.parent = Some(self.id);
        if child.page.is_none() {
            child.page = self.page;
        }
        self.children.push(child);
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key, value);
        self
    }

    pub fn with_ref(mut self, page: PageId) -> Self {
        self.refs.insert(page);
        self
    }

    pub fn with_page(mut self, page: PageId) -> Self {
        self.page = Some(page);
        self
    }
}

/// Reference to a block, by uuid or numeric id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockRef {
    Uuid(String),
    Id(BlockId),
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => write!(f, "uuid {}", uuid),
            Self::Id(id) => write!(f, "id {}", id),
        }
    }
}

/// A page of the host graph. Tags are pages too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// Lower-cased page name
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    /// Names of pages declared as aliases of this page
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>) -> Self {
        let original: String = name.into();
        Self {
            id,
            name: original.to_lowercase(),
            original_name: Some(original),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Name as the user typed it
    pub fn display_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.name)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Which side of a multi-line card is asked first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Content on the front, children on the back
    #[serde(rename = "->")]
    Forward,
    /// Children on the front
    #[serde(rename = "<-")]
    Reverse,
    /// Both cards
    #[serde(rename = "<->")]
    Bidirectional,
}

impl Direction {
    /// Parse the arrow notation used by the `direction` property
    pub fn from_arrow(value: &str) -> Option<Self> {
        match value.trim() {
            "->" => Some(Self::Forward),
            "<-" => Some(Self::Reverse),
            "<->" => Some(Self::Bidirectional),
            _ => None,
        }
    }

    pub fn as_arrow(self) -> &'static str {
        match self {
            Self::Forward => "->",
            Self::Reverse => "<-",
            Self::Bidirectional => "<->",
        }
    }

    /// Whether the card leads with the children outline
    pub fn leads_with_children(self) -> bool {
        matches!(self, Self::Reverse | Self::Bidirectional)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arrow())
    }
}

/// Matches `depth-<N>` tag names
static DEPTH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^depth-(\d+)$").unwrap());

/// Recognized classification tag of a multi-line card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTag {
    Forward,
    Reversed,
    Bidirectional,
    Incremental,
    Depth(usize),
}

impl CardTag {
    /// Highest depth tag in the vocabulary
    pub const MAX_DEPTH_TAG: usize = 9;

    /// Parse a tag (page) name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(Self::Forward),
            "reversed" => Some(Self::Reversed),
            "bidirectional" => Some(Self::Bidirectional),
            "incremental" => Some(Self::Incremental),
            other => DEPTH_TAG
                .captures(other)
                .and_then(|caps| caps[1].parse::<usize>().ok())
                .map(Self::Depth),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Forward => "forward".to_string(),
            Self::Reversed => "reversed".to_string(),
            Self::Bidirectional => "bidirectional".to_string(),
            Self::Incremental => "incremental".to_string(),
            Self::Depth(n) => format!("depth-{}", n),
        }
    }

    /// Candidate tag names, in resolution order
    pub fn vocabulary() -> Vec<String> {
        let mut names: Vec<String> = [
            Self::Forward,
            Self::Reversed,
            Self::Bidirectional,
            Self::Incremental,
        ]
        .iter()
        .map(Self::name)
        .collect();
        names.extend((1..=Self::MAX_DEPTH_TAG).map(|n| Self::Depth(n).name()));
        names
    }

    /// Whether this tag says anything about card direction
    pub fn is_directional(&self) -> bool {
        matches!(self, Self::Forward | Self::Reversed | Self::Bidirectional)
    }
}

impl fmt::Display for CardTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Kind of note a card was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[serde(rename = "multiline_card")]
    Multiline,
    Cloze,
    SwiftArrow,
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multiline => f.write_str("multiline_card"),
            Self::Cloze => f.write_str("cloze"),
            Self::SwiftArrow => f.write_str("swift_arrow"),
        }
    }
}

/// HTML produced by the content renderer, with referenced media
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedHtml {
    pub html: String,
    pub assets: BTreeSet<String>,
}

/// A named card field and its rendered HTML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardField {
    pub name: String,
    pub html: String,
}

impl CardField {
    pub fn new(name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            html: html.into(),
        }
    }
}

/// Renderable card handed to the card-creation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayload {
    /// Uuid of the source block
    pub uuid: String,
    pub note_type: NoteType,
    pub model: String,
    pub fields: Vec<CardField>,
    pub html: String,
    #[serde(default)]
    pub assets: BTreeSet<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CardPayload {
    /// HTML of a field by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.html.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_text_forms() {
        assert_eq!(PropertyValue::from(3.0).to_text(), "3");
        assert_eq!(PropertyValue::from(2.5).to_text(), "2.5");
        assert_eq!(PropertyValue::from(true).to_text(), "true");
        let list = PropertyValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(list.to_text(), "a, b");
    }

    #[test]
    fn test_property_value_positive_int() {
        assert_eq!(PropertyValue::from(2i64).as_positive_int(), Some(2));
        assert_eq!(PropertyValue::from("4").as_positive_int(), Some(4));
        assert_eq!(PropertyValue::from(0i64).as_positive_int(), None);
        assert_eq!(PropertyValue::from(1.5).as_positive_int(), None);
        assert_eq!(PropertyValue::from("-1").as_positive_int(), None);
        assert_eq!(PropertyValue::from(true).as_positive_int(), None);
    }

    #[test]
    fn test_property_map_deserializes_typed_values() {
        let json = r#"{"depth": 2, "direction": "<-", "public": true, "tags": ["a", "b"]}"#;
        let map: PropertyMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.get_positive_int("depth"), Some(2));
        assert_eq!(map.get_str("direction"), Some("<-"));
        assert_eq!(map.get("public"), Some(&PropertyValue::Bool(true)));
        assert_eq!(map.get_text("tags").as_deref(), Some("a, b"));
        assert_eq!(map.get_text_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_property_map_prefix_iteration() {
        let map: PropertyMap = [
            ("field-front", "content"),
            ("field-back", "children"),
            ("field-", "ignored"),
            ("model", "Basic"),
        ]
        .into_iter()
        .collect();

        let fields: Vec<_> = map.with_prefix("field-").map(|(k, _)| k).collect();
        assert_eq!(fields, vec!["back", "front"]);
    }

    #[test]
    fn test_direction_arrows() {
        assert_eq!(Direction::from_arrow("<->"), Some(Direction::Bidirectional));
        assert_eq!(Direction::from_arrow(" <- "), Some(Direction::Reverse));
        assert_eq!(Direction::from_arrow("=>"), None);
        assert!(Direction::Reverse.leads_with_children());
        assert!(!Direction::Forward.leads_with_children());
    }

    #[test]
    fn test_card_tag_parsing() {
        assert_eq!(CardTag::parse("Reversed"), Some(CardTag::Reversed));
        assert_eq!(CardTag::parse("depth-3"), Some(CardTag::Depth(3)));
        assert_eq!(CardTag::parse("DEPTH-12"), Some(CardTag::Depth(12)));
        assert_eq!(CardTag::parse("depth-"), None);
        assert_eq!(CardTag::parse("card"), None);
    }

    #[test]
    fn test_card_tag_vocabulary() {
        let vocab = CardTag::vocabulary();
        assert_eq!(vocab.len(), 13);
        assert_eq!(vocab[0], "forward");
        assert_eq!(vocab[12], "depth-9");
        assert!(vocab.iter().all(|name| CardTag::parse(name).is_some()));
    }

    #[test]
    fn test_block_builder_wires_parent() {
        let block = Block::new(1, "p", "parent")
            .with_page(7)
            .with_child(Block::new(2, "c", "child"));
        assert_eq!(block.children[0].parent, Some(1));
        assert_eq!(block.children[0].page, Some(7));
    }
}
