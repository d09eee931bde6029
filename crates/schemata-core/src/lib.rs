//! Schemata Core - Keyword evaluation engine for multi-draft JSON Schema
//!
//! This crate parses JSON Schema documents of drafts 6, 7, 2019-09 and
//! 2020-12 and evaluates instances against them, producing a result tree
//! with errors and annotations.
//!
//! # Main Components
//!
//! - **Keyword Catalog**: explicit table of keyword kinds with dependency-driven priorities
//! - **Schema Model**: parsed documents, resources and anchors
//! - **Resolver**: static and dynamic reference resolution
//! - **Evaluator**: priority-ordered keyword evaluation with annotation tracking
//! - **Output**: flag, basic, detailed and hierarchical projections
//!
//! # Example
//!
//! ```no_run
//! use schemata_core::{JsonSchema, Result, ValidationOptions};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let schema = JsonSchema::from_value(json!({
//!         "type": "object",
//!         "properties": {"a": {}},
//!         "unevaluatedProperties": false
//!     }))?;
//!     let results = schema.validate(&json!({"a": 1}), &ValidationOptions::default())?;
//!     assert!(results.is_valid());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod context;
pub mod draft;
pub mod error;
pub mod evaluator;
pub mod formats;
pub mod instance;
pub mod keywords;
pub mod messages;
pub mod meta;
pub mod options;
pub mod output;
pub mod pointer;
pub mod registry;
pub mod resolver;
pub mod result;
pub mod schema;
pub mod vocabulary;

// Re-export main types for convenience
pub use catalog::{KeywordCatalog, KeywordDescriptor, KeywordParser, KeywordSpec};
pub use context::{DynamicScopeFrame, EvaluationContext, TraceSink};
pub use draft::{Draft, DraftSet, UnsupportedDraft};
pub use error::{Error, Result};
pub use evaluator::validate;
pub use formats::{Format, FormatRegistry, RegexFormat, UnknownFormat};
pub use instance::SchemaValueType;
pub use keywords::data::DataFetcher;
pub use keywords::Keyword;
pub use options::{ValidationOptions, DEFAULT_MAX_TRAVERSAL_DEPTH};
pub use output::{EvaluationResults, OutputFormat, OutputUnit};
pub use pointer::{JsonPointer, PointerError};
pub use registry::{DocumentFetcher, SchemaRegistry, SchemaResource};
pub use resolver::ReferenceKind;
pub use result::LocalResult;
pub use schema::{JsonSchema, KeywordInstance, NodeKind, ParseContext, SchemaNode, SchemaParser};
pub use vocabulary::VocabularySet;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
