//! # Blockcards Core
//!
//! Core data models, error types, and configuration for the flashcard extraction pipeline.
//! This crate defines the canonical types that all other crates depend on.
//!
//! ## Architecture Principles
//!
//! - **Type-Driven Design**: typed property values and card tags replace string-based lookups
//! - **Zero Panic in Libraries**: All errors are `Result<T, Error>`
//! - **Builder Pattern for Complex Types**: Configuration structs use builders
//! - **Read-Only Snapshots**: blocks are never mutated by the pipeline
//!
//! ## Core Modules
//!
//! - [`models`] - Blocks, pages, property maps, card tags and card payloads
//! - [`error`] - Error types and Result alias
//! - [`config`] - Extraction configuration
//! - [`utils`] - Serialization helpers
//!
//! ## Usage Examples
//!
//! ### Building a block
//!
//! ```
//! use blockcards_core::prelude::*;
//!
//! let block = Block::new(1, "b-1", "Question? #card")
//!     .with_property("model", "Basic")
//!     .with_child(Block::new(2, "b-2", "Answer"));
//!
//! assert_eq!(block.children.len(), 1);
//! assert_eq!(block.properties.get_text_or("model", "Cloze"), "Basic");
//! ```
//!
//! ### Configuration
//!
//! ```
//! use blockcards_core::prelude::*;
//!
//! let config = ExtractionConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.default_model, "Basic");
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use config::*;
pub use error::{Error, Result};
pub use models::*;
pub use utils::{CSVBuilder, to_json_string};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ExtractionConfig, PropertyKeys, UNLIMITED_DEPTH};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        Block, BlockId, BlockRef, CardField, CardPayload, CardTag, ContentFormat, Direction,
        NoteType, Page, PageId, PropertyMap, PropertyValue, RenderedHtml,
    };
}
