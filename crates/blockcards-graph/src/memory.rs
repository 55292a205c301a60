//! In-memory block graph using petgraph for reference lookups

use async_trait::async_trait;
use blockcards_core::prelude::*;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::proxy::{BlockQuery, GraphProxy};

/// Serialized form of a graph: pages plus top-level block trees
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl GraphSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

/// Graph statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub pages: usize,
    pub blocks: usize,
    pub references: usize,
}

/// Node of the reference graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GraphNode {
    Page(PageId),
    Block(BlockId),
}

/// A block stored without its children; child order is kept by id
#[derive(Debug, Clone)]
struct StoredBlock {
    block: Block,
    children: Vec<BlockId>,
}

#[derive(Debug, Default)]
struct GraphState {
    /// Directed graph: block -> referenced page
    graph: DiGraph<GraphNode, ()>,
    node_index: HashMap<GraphNode, NodeIndex>,
    blocks: HashMap<BlockId, StoredBlock>,
    uuid_index: HashMap<String, BlockId>,
    pages: HashMap<PageId, Page>,
    page_names: HashMap<String, PageId>,
    next_page_id: PageId,
}

impl GraphState {
    fn node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.node_index.insert(node, idx);
        idx
    }

    fn add_page(&mut self, page: Page) -> Result<()> {
        if self.pages.contains_key(&page.id) {
            return Err(Error::parse_error(format!("Duplicate page id {}", page.id)));
        }
        let key = page.name.to_lowercase();
        if self.page_names.contains_key(&key) {
            return Err(Error::parse_error(format!("Duplicate page name '{}'", page.name)));
        }
        self.node(GraphNode::Page(page.id));
        self.next_page_id = self.next_page_id.max(page.id + 1);
        self.page_names.insert(key, page.id);
        self.pages.insert(page.id, page);
        Ok(())
    }

    /// Store a block tree, flattening children into the id table.
    fn add_block_tree(&mut self, root: Block) -> Result<()> {
        let mut stack = vec![(root, None::<BlockId>)];

        while let Some((mut block, parent)) = stack.pop() {
            if self.blocks.contains_key(&block.id) {
                return Err(Error::parse_error(format!("Duplicate block id {}", block.id)));
            }
            if self.uuid_index.contains_key(&block.uuid) {
                return Err(Error::parse_error(format!(
                    "Duplicate block uuid {}",
                    block.uuid
                )));
            }

            if parent.is_some() {
                block.parent = parent;
            }
            let children = std::mem::take(&mut block.children);
            let child_ids: Vec<BlockId> = children.iter().map(|c| c.id).collect();

            let block_idx = self.node(GraphNode::Block(block.id));
            for page_id in &block.refs {
                match self.node_index.get(&GraphNode::Page(*page_id)).copied() {
                    Some(page_idx) => {
                        self.graph.add_edge(block_idx, page_idx, ());
                    }
                    None => log::warn!(
                        "Block {} references unknown page id {}",
                        block.uuid,
                        page_id
                    ),
                }
            }

            self.next_page_id = self.next_page_id.max(block.id + 1);
            self.uuid_index.insert(block.uuid.clone(), block.id);
            let id = block.id;
            let page = block.page;
            self.blocks.insert(
                id,
                StoredBlock {
                    block,
                    children: child_ids,
                },
            );

            for mut child in children.into_iter().rev() {
                if child.page.is_none() {
                    child.page = page;
                }
                stack.push((child, Some(id)));
            }
        }

        Ok(())
    }

    fn resolve(&self, block: &BlockRef) -> Option<BlockId> {
        match block {
            BlockRef::Id(id) => self.blocks.contains_key(id).then_some(*id),
            BlockRef::Uuid(uuid) => self.uuid_index.get(uuid).copied(),
        }
    }

    fn shallow(&self, id: BlockId) -> Option<Block> {
        self.blocks.get(&id).map(|stored| stored.block.clone())
    }

    /// Rebuild the subtree rooted at `id` without recursing
    fn assemble(&self, id: BlockId) -> Option<Block> {
        let root = self.blocks.get(&id)?;

        // Pre-order: every node lands after its parent
        let mut order: Vec<(&StoredBlock, Vec<usize>)> = Vec::new();
        let mut stack: Vec<(&StoredBlock, Option<usize>)> = vec![(root, None)];
        while let Some((stored, parent)) = stack.pop() {
            let slot = order.len();
            order.push((stored, Vec::new()));
            if let Some(parent) = parent {
                order[parent].1.push(slot);
            }
            for child in stored.children.iter().rev() {
                if let Some(child) = self.blocks.get(child) {
                    stack.push((child, Some(slot)));
                }
            }
        }

        let mut built: Vec<Option<Block>> = vec![None; order.len()];
        for (slot, (stored, children)) in order.iter().enumerate().rev() {
            let mut block = stored.block.clone();
            block.children = children.iter().filter_map(|c| built[*c].take()).collect();
            built[slot] = Some(block);
        }
        built.first_mut().and_then(Option::take)
    }

    fn page_id(&self, name: &str) -> Option<PageId> {
        self.page_names.get(&name.to_lowercase()).copied()
    }

    /// Ids of blocks referencing the given page, ascending
    fn referencing_blocks(&self, page: PageId) -> BTreeSet<BlockId> {
        let Some(&idx) = self.node_index.get(&GraphNode::Page(page)) else {
            return BTreeSet::new();
        };
        self.graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|edge| match self.graph[edge.source()] {
                GraphNode::Block(id) => Some(id),
                GraphNode::Page(_) => None,
            })
            .collect()
    }

    /// Pages that are aliases of the named page, in either declaration direction
    fn alias_pages(&self, name: &str) -> BTreeSet<PageId> {
        let name = name.to_lowercase();
        let target = self.page_id(&name).and_then(|id| self.pages.get(&id));

        let mut ids: BTreeSet<PageId> = self
            .pages
            .values()
            .filter(|page| page.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(&name)))
            .map(|page| page.id)
            .collect();

        if let Some(target) = target {
            ids.extend(target.aliases.iter().filter_map(|alias| self.page_id(alias)));
            ids.remove(&target.id);
        }
        ids
    }
}

/// Graph proxy over an in-memory snapshot
pub struct InMemoryGraph {
    name: String,
    state: RwLock<GraphState>,
}

impl InMemoryGraph {
    /// Build a graph from a snapshot, validating id uniqueness
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut state = GraphState {
            next_page_id: 1,
            ..GraphState::default()
        };

        for page in snapshot.pages {
            state.add_page(page)?;
        }
        for block in snapshot.blocks {
            state.add_block_tree(block)?;
        }

        log::info!(
            "Graph '{}' loaded: {} pages, {} blocks, {} references",
            snapshot.name,
            state.pages.len(),
            state.blocks.len(),
            state.graph.edge_count()
        );

        Ok(Self {
            name: snapshot.name,
            state: RwLock::new(state),
        })
    }

    /// Load a JSON snapshot from disk
    #[instrument(skip_all, fields(path = ?path), name = "graph_load")]
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(Error::io)?;
        let snapshot: GraphSnapshot = serde_json::from_str(&content).map_err(|e| {
            Error::parse_error(format!("Invalid graph snapshot {}: {}", path.display(), e))
        })?;
        Self::from_snapshot(snapshot)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn stats(&self) -> GraphStats {
        let state = self.state.read().await;
        GraphStats {
            pages: state.pages.len(),
            blocks: state.blocks.len(),
            references: state.graph.edge_count(),
        }
    }
}

#[async_trait]
impl GraphProxy for InMemoryGraph {
    async fn get_page(&self, name: &str) -> Result<Option<Page>> {
        let state = self.state.read().await;
        Ok(state
            .page_id(name)
            .and_then(|id| state.pages.get(&id))
            .cloned())
    }

    async fn get_page_by_id(&self, id: PageId) -> Result<Option<Page>> {
        Ok(self.state.read().await.pages.get(&id).cloned())
    }

    async fn get_block(&self, block: &BlockRef, include_children: bool) -> Result<Option<Block>> {
        let state = self.state.read().await;
        let Some(id) = state.resolve(block) else {
            log::debug!("Block not found: {}", block);
            return Ok(None);
        };
        Ok(if include_children {
            state.assemble(id)
        } else {
            state.shallow(id)
        })
    }

    #[instrument(skip_all, fields(query = %query), name = "graph_query")]
    async fn query(&self, query: &BlockQuery) -> Result<Vec<Block>> {
        let state = self.state.read().await;

        let ids: Vec<BlockId> = match query {
            BlockQuery::ReferencesPage(name) => match state.page_id(name) {
                Some(page) => state.referencing_blocks(page).into_iter().collect(),
                None => Vec::new(),
            },
            BlockQuery::ReferencesPageAlias(name) => state
                .alias_pages(name)
                .into_iter()
                .flat_map(|page| state.referencing_blocks(page))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            BlockQuery::ChildrenOfTagged(name) => match state.page_id(name) {
                Some(page) => state
                    .referencing_blocks(page)
                    .into_iter()
                    .filter_map(|parent| state.blocks.get(&parent))
                    .flat_map(|stored| stored.children.iter().copied())
                    .collect(),
                None => Vec::new(),
            },
            BlockQuery::ContentMatches(pattern) => {
                let re = Regex::new(pattern)
                    .map_err(|e| Error::query_failed(query.to_string(), e.to_string()))?;
                let mut ids: Vec<BlockId> = state
                    .blocks
                    .values()
                    .filter(|stored| re.is_match(&stored.block.content))
                    .map(|stored| stored.block.id)
                    .collect();
                ids.sort_unstable();
                ids
            }
        };

        let blocks: Vec<Block> = ids.into_iter().filter_map(|id| state.shallow(id)).collect();
        log::debug!("Query {} matched {} blocks", query, blocks.len());
        Ok(blocks)
    }

    async fn create_page_if_not_exists(&self, name: &str) -> Result<Page> {
        if name.trim().is_empty() {
            return Err(Error::other("Page name cannot be empty"));
        }

        let mut state = self.state.write().await;
        if let Some(page) = state.page_id(name).and_then(|id| state.pages.get(&id)) {
            return Ok(page.clone());
        }

        let page = Page::new(state.next_page_id, name.trim());
        state.add_page(page.clone())?;
        log::info!("Created page '{}' (id {})", page.display_name(), page.id);
        Ok(page)
    }
}
