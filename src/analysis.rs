//! Read-only analysis visitors
//!
//! Any type implementing the [`Visitor`](crate::traversal::Visitor) contract
//! can be driven by the traversal engine in place of the converter. The
//! visitors here count tag usage without touching the namespace manager or
//! producing any target tree side effects.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::documents::{NodeId, XsdDocument};
use crate::error::Result;
use crate::jsonschema::SchemaNode;
use crate::traversal::Visitor;

/// Per-document tag usage counter
///
/// Each document URI is accepted once per run; `on_begin` rejects a repeat
/// visit of the same URI.
#[derive(Debug, Default)]
pub struct XsdUsageVisitor {
    uris: HashSet<String>,
    counts: IndexMap<String, IndexMap<String, u64>>,
}

impl XsdUsageVisitor {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of a tag within one document
    pub fn count_for(&self, uri: &str, tag: &str) -> u64 {
        self.counts
            .get(uri)
            .and_then(|tags| tags.get(tag))
            .copied()
            .unwrap_or(0)
    }

    /// Tag counts for one document in first-seen order
    pub fn document_counts(&self, uri: &str) -> Option<&IndexMap<String, u64>> {
        self.counts.get(uri)
    }

    /// URIs visited so far
    pub fn uris(&self) -> Vec<&str> {
        self.counts.keys().map(|s| s.as_str()).collect()
    }
}

impl Visitor for XsdUsageVisitor {
    fn on_begin(&mut self, _json_schema: &SchemaNode, doc: &XsdDocument) -> bool {
        if !self.uris.insert(doc.uri().to_string()) {
            return false;
        }
        self.counts.entry(doc.uri().to_string()).or_default();
        true
    }

    fn enter_state(&mut self, _node: NodeId, _json_schema: &SchemaNode, _doc: &XsdDocument) {}

    fn visit(
        &mut self,
        node: NodeId,
        _json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        let tags = self.counts.entry(doc.uri().to_string()).or_default();
        *tags.entry(doc.name(node).to_string()).or_insert(0) += 1;
        Ok(true)
    }

    fn exit_state(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_end(&mut self, _json_schema: &SchemaNode, _doc: &XsdDocument) {}
}

/// Tag usage counter summed across all documents of a run
#[derive(Debug, Default)]
pub struct XsdUsageVisitorSum {
    uris: HashSet<String>,
    counts: IndexMap<String, u64>,
}

impl XsdUsageVisitorSum {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated count of a tag across every visited document
    pub fn tag_count(&self, tag: &str) -> u64 {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    /// All accumulated counts in first-seen order
    pub fn counts(&self) -> &IndexMap<String, u64> {
        &self.counts
    }
}

impl Visitor for XsdUsageVisitorSum {
    fn on_begin(&mut self, _json_schema: &SchemaNode, doc: &XsdDocument) -> bool {
        self.uris.insert(doc.uri().to_string())
    }

    fn enter_state(&mut self, _node: NodeId, _json_schema: &SchemaNode, _doc: &XsdDocument) {}

    fn visit(
        &mut self,
        node: NodeId,
        _json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        *self
            .counts
            .entry(doc.name(node).to_string())
            .or_insert(0) += 1;
        Ok(true)
    }

    fn exit_state(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_end(&mut self, _json_schema: &SchemaNode, _doc: &XsdDocument) {}
}
