//! Default content renderer built on pulldown-cmark.

use async_trait::async_trait;
use blockcards_core::prelude::*;
use pulldown_cmark::{Event, Options, Parser, Tag, html};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::ContentRenderer;
use crate::escape::{escape_html, strip_properties};

/// Regex for page references: [[target]]
static PAGE_REF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());

/// Regex for highlights: ^^text^^
static HIGHLIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\^\^(.+?)\^\^").unwrap());

/// Regex for org links: [[target]] or [[target][description]]
static ORG_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\](?:\[([^\]]+)\])?\]").unwrap());

/// Whether a link target points outside the graph's assets
fn is_remote(dest: &str) -> bool {
    let lower = dest.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("data:")
        || lower.starts_with("mailto:")
}

fn is_image(dest: &str) -> bool {
    let lower = dest.to_ascii_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".bmp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

/// Convert page references and highlights into inline HTML pulldown-cmark passes through.
fn preprocess_markdown(markdown: &str) -> String {
    let with_refs = PAGE_REF_RE.replace_all(markdown, |caps: &regex::Captures| {
        format!(
            "<span class=\"page-ref\">{}</span>",
            escape_html(caps[1].trim())
        )
    });
    HIGHLIGHT_RE
        .replace_all(&with_refs, "<mark>$1</mark>")
        .to_string()
}

/// Markup renderer for Logseq-flavoured markdown and a plain subset of org.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    /// Render markdown synchronously, collecting local image assets.
    pub fn render_markdown(&self, markup: &str) -> RenderedHtml {
        let source = preprocess_markdown(&strip_properties(markup));
        let mut assets = BTreeSet::new();

        let events: Vec<Event> = Parser::new_ext(&source, self.options)
            .inspect(|event| {
                if let Event::Start(Tag::Image { dest_url, .. }) = event
                    && !is_remote(dest_url)
                {
                    assets.insert(dest_url.to_string());
                }
            })
            .collect();

        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());

        RenderedHtml { html: out, assets }
    }

    /// Render org content: paragraphs and links only.
    pub fn render_org(&self, markup: &str) -> RenderedHtml {
        let source = strip_properties(markup);
        let mut assets = BTreeSet::new();
        let mut out = String::new();

        for paragraph in source.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            let escaped = escape_html(paragraph);
            let linked = ORG_LINK_RE.replace_all(&escaped, |caps: &regex::Captures| {
                let target = caps[1].trim_start_matches("file:");
                let label = caps.get(2).map(|m| m.as_str()).unwrap_or(target);
                if is_image(target) {
                    if !is_remote(target) {
                        assets.insert(target.to_string());
                    }
                    format!("<img src=\"{}\" alt=\"{}\" />", target, label)
                } else {
                    format!("<span class=\"page-ref\">{}</span>", label)
                }
            });
            out.push_str("<p>");
            out.push_str(&linked.replace('\n', "<br />\n"));
            out.push_str("</p>\n");
        }

        RenderedHtml { html: out, assets }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentRenderer for MarkdownRenderer {
    async fn render(&self, markup: &str, format: ContentFormat) -> Result<RenderedHtml> {
        let rendered = match format {
            ContentFormat::Markdown => self.render_markdown(markup),
            ContentFormat::Org => self.render_org(markup),
        };
        log::trace!(
            "Rendered {} bytes of {} into {} bytes of HTML",
            markup.len(),
            format,
            rendered.html.len()
        );
        Ok(rendered)
    }
}
