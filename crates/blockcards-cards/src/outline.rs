//! Children outline rendering.
//!
//! The subtree is flattened into an arena with an explicit stack, every node is
//! rendered concurrently, and the nested list markup is assembled iteratively
//! from the per-node results. Deep outlines never recurse.

use blockcards_core::prelude::*;
use blockcards_render::{ContentRenderer, escape_cloze_delimiters, strip_properties};
use futures::future::try_join_all;
use std::collections::BTreeSet;

const LIST_OPEN: &str = "\n<ul class=\"children-list\">";
const LIST_CLOSE: &str = "</ul>";

struct OutlineNode<'a> {
    block: &'a Block,
    children: Vec<usize>,
}

/// Blocks within the depth cap, indexed in allocation order
struct OutlineArena<'a> {
    nodes: Vec<OutlineNode<'a>>,
    roots: Vec<usize>,
}

impl<'a> OutlineArena<'a> {
    fn build(children: &'a [Block], max_depth: usize) -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        };
        if max_depth == 0 {
            return arena;
        }

        let mut stack: Vec<(usize, usize)> = Vec::new();
        for child in children {
            let idx = arena.alloc(child);
            arena.roots.push(idx);
            stack.push((idx, 0));
        }

        while let Some((idx, level)) = stack.pop() {
            let block = arena.nodes[idx].block;
            if block.children.is_empty() || level + 1 >= max_depth {
                continue;
            }
            let mut ids = Vec::with_capacity(block.children.len());
            for child in &block.children {
                let child_idx = arena.alloc(child);
                ids.push(child_idx);
                stack.push((child_idx, level + 1));
            }
            arena.nodes[idx].children = ids;
        }

        arena
    }

    fn alloc(&mut self, block: &'a Block) -> usize {
        self.nodes.push(OutlineNode {
            block,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }
}

/// Render direct children and their descendants as nested lists.
///
/// Level 0 is the direct children; level `L` is emitted only when
/// `L < max_depth`. No children or `max_depth == 0` yields empty HTML.
pub async fn render_children(
    children: &[Block],
    max_depth: usize,
    keys: &PropertyKeys,
    renderer: &dyn ContentRenderer,
) -> Result<RenderedHtml> {
    let arena = OutlineArena::build(children, max_depth);
    if arena.roots.is_empty() {
        return Ok(RenderedHtml::default());
    }

    let rendered = try_join_all(
        arena
            .nodes
            .iter()
            .map(|node| render_item(node.block, keys, renderer)),
    )
    .await?;

    let mut html = String::from(LIST_OPEN);
    let mut assets = BTreeSet::new();
    let mut stack: Vec<(&[usize], usize)> = vec![(arena.roots.as_slice(), 0)];

    while let Some(frame) = stack.last_mut() {
        let next = frame.0.get(frame.1).copied();
        frame.1 += 1;

        let Some(idx) = next else {
            stack.pop();
            html.push_str(LIST_CLOSE);
            if !stack.is_empty() {
                html.push_str("</li>");
            }
            continue;
        };

        let node = &arena.nodes[idx];
        let marker = if is_numbered(node.block, keys) {
            "numbered"
        } else {
            "bulleted"
        };
        html.push_str("\n<li class=\"children ");
        html.push_str(marker);
        html.push_str("\">");
        html.push_str(&rendered[idx].html);
        assets.extend(rendered[idx].assets.iter().cloned());

        if node.children.is_empty() {
            html.push_str("</li>");
        } else {
            html.push_str(LIST_OPEN);
            stack.push((node.children.as_slice(), 0));
        }
    }

    Ok(RenderedHtml { html, assets })
}

async fn render_item(
    block: &Block,
    keys: &PropertyKeys,
    renderer: &dyn ContentRenderer,
) -> Result<RenderedHtml> {
    let source = escape_cloze_delimiters(&strip_properties(&block.content));
    let extra = block
        .properties
        .get_text(&keys.extra)
        .filter(|extra| !extra.trim().is_empty())
        .map(|extra| escape_cloze_delimiters(&extra));

    let Some(extra) = extra else {
        return renderer.render(&source, block.format).await;
    };

    let (mut item, extra) = futures::try_join!(
        renderer.render(&source, block.format),
        renderer.render(&extra, block.format)
    )?;
    item.html.push_str("<div class=\"extra\">");
    item.html.push_str(&extra.html);
    item.html.push_str("</div>");
    item.assets.extend(extra.assets);
    Ok(item)
}

fn is_numbered(block: &Block, keys: &PropertyKeys) -> bool {
    block
        .properties
        .get_text(&keys.order_list_type)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("number"))
}
