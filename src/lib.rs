//! # xsd2jsonschema
//!
//! Convert XML Schema (XSD) documents to JSON Schema documents.
//!
//! The conversion preserves type identity, namespace structure, and
//! cross-document type references: a type may be referenced before it is
//! converted (including across files and in self or mutual recursion), and
//! the reference is patched to its final location once the type is produced.
//!
//! ## Features
//!
//! - Named simple and complex types, elements, attributes and attribute groups
//! - Restriction facets mapped onto JSON Schema constraint keywords
//! - Forward references across documents with an end-of-run resolution check
//! - Combinator rewrites for constructs with no direct JSON Schema equivalent
//!   (e.g. an optional exclusive choice inside a sequence)
//! - Read-only analysis visitors driven by the same traversal engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsd2jsonschema::{ConversionRun, XsdDocument};
//!
//! let doc = XsdDocument::parse("example.xsd", &xsd_text)?;
//! let outcome = ConversionRun::new().convert_all(&[doc])?;
//!
//! for (uri, schema) in &outcome.schemas {
//!     println!("{}: {}", uri, serde_json::to_string_pretty(&schema.to_value())?);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;

// Source side: XSD document tree
pub mod documents;

// Target side: JSON Schema tree and references
pub mod jsonschema;

// Built-in type mapping
pub mod builtins;

// Namespace-scoped type registry
pub mod namespaces;

// Traversal engine and visitors
pub mod analysis;
pub mod converter;
pub mod special;
pub mod traversal;

// Driver
pub mod conversion;

// Re-exports for convenience
pub use conversion::{ConversionConfig, ConversionRun};
pub use documents::{NodeId, NodeKind, XsdDocument};
pub use error::{Error, Result};
pub use jsonschema::{JsonType, SchemaNode};
pub use namespaces::NamespaceManager;
pub use traversal::{DepthFirstTraversal, Visitor};

/// Version of the xsd2jsonschema library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// JSON Schema draft-04 identifier
pub const JSON_SCHEMA_DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// Synthetic namespace holding global attribute declarations
pub const GLOBAL_ATTRIBUTES_NAMESPACE: &str = "globalAttributes";
