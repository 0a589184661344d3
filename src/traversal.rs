//! Generic depth-first traversal of an XSD document tree
//!
//! The engine is policy-free: it drives any [`Visitor`], whether the
//! converting one or a read-only analysis pass, through one document in
//! source order with strict LIFO enter/exit discipline.

use crate::documents::{NodeId, NodeKind, XsdDocument};
use crate::error::Result;
use crate::jsonschema::SchemaNode;

/// Per-node lifecycle contract driving one traversal pass
///
/// Hook order for each element node, pre-order: `enter_state`, `visit`
/// (whose return value decides whether children are walked), children in
/// document order, then `exit_state` — which runs unconditionally, also
/// when `visit` declined recursion or returned an error.
pub trait Visitor {
    /// Called once before the walk; returning `false` skips the document
    fn on_begin(&mut self, json_schema: &SchemaNode, doc: &XsdDocument) -> bool;

    /// Push lexical context for a node
    fn enter_state(&mut self, node: NodeId, json_schema: &SchemaNode, doc: &XsdDocument);

    /// Process a node; `Ok(true)` recurses into its children
    fn visit(&mut self, node: NodeId, json_schema: &SchemaNode, doc: &XsdDocument)
        -> Result<bool>;

    /// Pop lexical context; always invoked after the node's subtree
    fn exit_state(&mut self) -> Result<()>;

    /// Called once after the whole document (or the skip) completes
    fn on_end(&mut self, json_schema: &SchemaNode, doc: &XsdDocument);
}

/// Depth-first walk dispatching visitor lifecycle hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthFirstTraversal;

impl DepthFirstTraversal {
    /// Create a traversal engine
    pub fn new() -> Self {
        Self
    }

    /// Run one pass over `doc`, building into `json_schema`
    ///
    /// A handler error propagates to the caller unchanged; `on_end` is not
    /// reached for a document whose conversion was aborted.
    pub fn traverse(
        &self,
        visitor: &mut dyn Visitor,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<()> {
        if !visitor.on_begin(json_schema, doc) {
            visitor.on_end(json_schema, doc);
            return Ok(());
        }
        self.walk(visitor, doc.root(), json_schema, doc)?;
        visitor.on_end(json_schema, doc);
        Ok(())
    }

    fn walk(
        &self,
        visitor: &mut dyn Visitor,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<()> {
        // Text and comment nodes terminate recursion without invoking hooks
        if doc.kind(node) != NodeKind::Element {
            return Ok(());
        }

        visitor.enter_state(node, json_schema, doc);
        let outcome = self.visit_and_recurse(visitor, node, json_schema, doc);
        let exited = visitor.exit_state();
        outcome.and(exited)
    }

    fn visit_and_recurse(
        &self,
        visitor: &mut dyn Visitor,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<()> {
        if visitor.visit(node, json_schema, doc)? {
            for &child in doc.children(node) {
                self.walk(visitor, child, json_schema, doc)?;
            }
        }
        Ok(())
    }
}
