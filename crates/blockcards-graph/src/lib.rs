//! # Block Graph Access
//!
//! The graph query proxy used by the extraction pipeline, and an in-memory
//! implementation over a JSON snapshot using petgraph.
//!
//! Provides:
//! - [`GraphProxy`]: page/block lookup, structured queries, idempotent page creation
//! - [`BlockQuery`]: by-tag, by-tag-alias, by-group and content queries
//! - [`InMemoryGraph`]: reference graph of blocks and pages built from a [`GraphSnapshot`]
//!
//! ## Quick Start
//!
//! ```
//! use blockcards_core::prelude::*;
//! use blockcards_graph::{BlockQuery, GraphProxy, GraphSnapshot, InMemoryGraph};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let snapshot = GraphSnapshot::new("notes")
//!     .with_page(Page::new(1, "card"))
//!     .with_block(Block::new(10, "q", "Question? #card").with_ref(1));
//!
//! let graph = InMemoryGraph::from_snapshot(snapshot)?;
//! let tagged = graph.query(&BlockQuery::ReferencesPage("card".into())).await?;
//! assert_eq!(tagged.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! - **Nodes**: pages and blocks
//! - **Edges**: block -> page references (tags and page links)
//! - Children are stored by id, in outline order, so subtrees can be rebuilt on demand

pub mod memory;
pub mod proxy;

pub use memory::{GraphSnapshot, GraphStats, InMemoryGraph};
pub use proxy::{BlockQuery, GraphProxy};

pub mod prelude {
    pub use crate::memory::{GraphSnapshot, GraphStats, InMemoryGraph};
    pub use crate::proxy::{BlockQuery, GraphProxy};
    pub use blockcards_core::prelude::*;
}
