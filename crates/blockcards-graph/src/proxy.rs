//! The graph query seam consumed by the extraction pipeline.

use async_trait::async_trait;
use blockcards_core::prelude::*;
use std::fmt;

/// Structured block queries understood by every proxy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockQuery {
    /// Blocks referencing the named page (tagged `#name`)
    ReferencesPage(String),
    /// Blocks referencing any alias page of the named page
    ReferencesPageAlias(String),
    /// Children of blocks referencing the named page
    ChildrenOfTagged(String),
    /// Blocks whose raw content matches a regular expression
    ContentMatches(String),
}

impl fmt::Display for BlockQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferencesPage(name) => write!(f, "references page '{}'", name),
            Self::ReferencesPageAlias(name) => write!(f, "references alias of page '{}'", name),
            Self::ChildrenOfTagged(name) => write!(f, "children of blocks tagged '{}'", name),
            Self::ContentMatches(pattern) => write!(f, "content matches /{}/", pattern),
        }
    }
}

/// Read access to the host graph, plus idempotent page creation used during setup.
///
/// Blocks returned by [`GraphProxy::query`] are shallow (no children);
/// [`GraphProxy::get_block`] returns the full subtree on request.
#[async_trait]
pub trait GraphProxy: Send + Sync {
    /// Look up a page by (case-insensitive) name
    async fn get_page(&self, name: &str) -> Result<Option<Page>>;

    async fn get_page_by_id(&self, id: PageId) -> Result<Option<Page>>;

    async fn get_block(&self, block: &BlockRef, include_children: bool) -> Result<Option<Block>>;

    async fn query(&self, query: &BlockQuery) -> Result<Vec<Block>>;

    async fn create_page_if_not_exists(&self, name: &str) -> Result<Page>;
}
