//! JSON Schema document tree
//!
//! The target-side node model produced by the converter: tree nodes with
//! draft-04 keywords and ordered sub-schemas, plus reference nodes and the
//! forward-reference machinery that lets a type be referenced before it has
//! been converted.

mod node;
mod refs;

pub use node::{JsonType, NodeConfig, SchemaNode};
pub use refs::{ForwardRefHandle, ForwardReference, Ref, RefOptions};
