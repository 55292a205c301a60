//! # Blockcards Render
//!
//! Content rendering for card fields, built on `pulldown-cmark`.
//!
//! This crate provides:
//! - The [`ContentRenderer`] seam: `render(markup, format) -> {html, assets}`
//! - [`MarkdownRenderer`], the default implementation (CommonMark plus Logseq page
//!   references and `^^highlights^^`, a paragraph-level org subset)
//! - Escaping helpers applied to outline content before rendering
//!
//! ## Quick Start
//!
//! ```
//! use blockcards_render::{ContentRenderer, MarkdownRenderer};
//! use blockcards_core::ContentFormat;
//!
//! # #[tokio::main]
//! # async fn main() -> blockcards_core::Result<()> {
//! let renderer = MarkdownRenderer::new();
//! let rendered = renderer.render("**Answer**", ContentFormat::Markdown).await?;
//! assert_eq!(rendered.html, "<p><strong>Answer</strong></p>\n");
//! # Ok(())
//! # }
//! ```
//!
//! Hosts with their own converter implement [`ContentRenderer`] instead; the
//! extraction pipeline only depends on the trait.

mod escape;
mod markdown;

use async_trait::async_trait;
use blockcards_core::{ContentFormat, RenderedHtml, Result};

pub use escape::{
    ZERO_WIDTH_SPACE, escape_cloze_delimiters, escape_html, strip_properties, strip_tags,
};
pub use markdown::MarkdownRenderer;

/// Converts raw block markup into an HTML fragment plus the media it references.
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    async fn render(&self, markup: &str, format: ContentFormat) -> Result<RenderedHtml>;
}
