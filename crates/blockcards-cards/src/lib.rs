//! # Card Synthesis
//!
//! Turns tagged outline blocks into renderable flashcards.
//!
//! Provides:
//! - [`TagResolver`]: reference-tag ids to the direction/depth vocabulary
//! - [`MultilineCardNote`]: direction, depth, field resolution and card assembly
//! - [`ClozeNote`] and [`SwiftArrowNote`]: the sibling note kinds
//! - [`CandidateSet`]: merge phase deduplicating candidates across extractors
//! - [`Extractor`]: the full pass over a [`GraphProxy`](blockcards_graph::GraphProxy)
//!
//! ## Quick Start
//!
//! ```
//! use blockcards_cards::Extractor;
//! use blockcards_core::prelude::*;
//! use blockcards_graph::{GraphSnapshot, InMemoryGraph};
//! use blockcards_render::MarkdownRenderer;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let snapshot = GraphSnapshot::new("notes")
//!     .with_page(Page::new(1, "card"))
//!     .with_block(
//!         Block::new(10, "q", "Question? #card")
//!             .with_ref(1)
//!             .with_child(Block::new(11, "a", "Answer")),
//!     );
//!
//! let extractor = Extractor::new(
//!     Arc::new(InMemoryGraph::from_snapshot(snapshot)?),
//!     Arc::new(MarkdownRenderer::new()),
//!     ExtractionConfig::default(),
//! );
//! let report = extractor.extract_cards().await?;
//! assert_eq!(report.cards[0].field("Front"), Some("<p>Question?</p>\n"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure isolation
//!
//! Discovery queries failing abort the pass. Anything that fails while a
//! single block is being turned into a note or a card drops that block only.

pub mod cloze;
pub mod dedup;
pub mod extract;
pub mod multiline;
pub mod note;
pub mod outline;
pub mod swift_arrow;
pub mod tags;

pub use cloze::{ClozeNote, convert_clozes};
pub use dedup::{CandidateSet, Merged, should_keep};
pub use extract::{CollectedNotes, ExtractionReport, Extractor, Harvest};
pub use multiline::MultilineCardNote;
pub use note::Note;
pub use outline::render_children;
pub use swift_arrow::{SwiftArrowNote, parse_swift_arrow};
pub use tags::{TagResolver, classify};

pub mod prelude {
    pub use crate::extract::{ExtractionReport, Extractor};
    pub use crate::multiline::MultilineCardNote;
    pub use crate::note::Note;
    pub use blockcards_core::prelude::*;
}
