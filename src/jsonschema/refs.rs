//! Reference nodes and forward references
//!
//! A [`Ref`] stands for "this location points at a named type". Each time it
//! is materialized at a location it produces a fresh `$ref`-bearing node and
//! records that node in an append-only site list, so that a later resolution
//! pass can rewrite every site when the final pointer becomes known. A
//! [`ForwardReference`] is the deferred binding between a requested
//! `(namespace, type name)` pair and the node that will eventually represent
//! it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::jsonschema::SchemaNode;

/// Identifies the pending `(namespace, type)` binding a reference belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRefHandle {
    /// Target namespace URI
    pub namespace: String,
    /// Requested type name
    pub type_name: String,
}

impl ForwardRefHandle {
    /// Create a handle for a `(namespace, type name)` pair
    pub fn new(namespace: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }
}

/// Construction options for a [`Ref`]
///
/// Exactly one of `name` and `pointer` must be supplied, and the
/// forward-reference handle is mandatory.
#[derive(Debug, Clone, Default)]
pub struct RefOptions {
    /// Direct type name the reference addresses
    pub name: Option<String>,
    /// Already-formed pointer string
    pub pointer: Option<String>,
    /// The pending binding this reference belongs to
    pub forward_reference: Option<ForwardRefHandle>,
}

impl RefOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direct type name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an already-formed pointer string
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    /// Set the forward-reference handle
    pub fn with_forward_reference(mut self, handle: ForwardRefHandle) -> Self {
        self.forward_reference = Some(handle);
        self
    }
}

#[derive(Debug)]
struct RefData {
    name: Option<String>,
    pointer: String,
    resolved: bool,
    sites: Vec<SchemaNode>,
    handle: ForwardRefHandle,
}

/// A reference to a named type
///
/// Cheap to clone as a handle; all clones share the same site list and
/// pointer state.
#[derive(Clone, Debug)]
pub struct Ref {
    inner: Rc<RefCell<RefData>>,
}

impl Ref {
    /// Construct a reference from options
    ///
    /// Fails with [`Error::InvalidArgument`] when neither or both of
    /// {name, pointer} are given, or when the forward-reference handle is
    /// missing.
    pub fn new(options: RefOptions) -> Result<Self> {
        let handle = options.forward_reference.ok_or_else(|| {
            Error::InvalidArgument("Ref requires a forward-reference handle".to_string())
        })?;

        let pointer = match (&options.name, &options.pointer) {
            (None, None) => {
                return Err(Error::InvalidArgument(
                    "Ref requires either a type name or a pointer string".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(Error::InvalidArgument(
                    "Ref accepts a type name or a pointer string, not both".to_string(),
                ))
            }
            (Some(name), None) => format!("#/{}", name),
            (None, Some(pointer)) => pointer.clone(),
        };

        Ok(Self {
            inner: Rc::new(RefCell::new(RefData {
                name: options.name,
                pointer,
                resolved: false,
                sites: Vec::new(),
                handle,
            })),
        })
    }

    /// The direct type name, if the reference was constructed from one
    pub fn name(&self) -> Option<String> {
        self.inner.borrow().name.clone()
    }

    /// The current pointer string (provisional until resolved)
    pub fn pointer(&self) -> String {
        self.inner.borrow().pointer.clone()
    }

    /// The pending binding this reference belongs to
    pub fn forward_handle(&self) -> ForwardRefHandle {
        self.inner.borrow().handle.clone()
    }

    /// Whether the reference has been resolved to its final pointer
    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().resolved
    }

    /// Number of tracked sites
    pub fn site_count(&self) -> usize {
        self.inner.borrow().sites.len()
    }

    /// Handles to every tracked site
    pub fn sites(&self) -> Vec<SchemaNode> {
        self.inner.borrow().sites.clone()
    }

    /// Overwrite the provisional pointer of an unresolved reference
    pub(crate) fn seed_pointer(&self, pointer: impl Into<String>) {
        let mut data = self.inner.borrow_mut();
        if !data.resolved {
            data.pointer = pointer.into();
        }
    }

    /// Materialize this reference at a location
    ///
    /// Returns a fresh node carrying the current pointer, owned by `parent`,
    /// and records it as a site. Sites created after resolution already carry
    /// the final pointer and need no later patch.
    pub fn ref_to_schema(&self, parent: &SchemaNode) -> SchemaNode {
        let node = SchemaNode::new();
        node.set_ref_pointer(self.pointer());
        parent.adopt(&node);
        self.inner.borrow_mut().sites.push(node.clone());
        node
    }

    /// Resolve to the final pointer, rewriting every tracked site
    pub fn resolve(&self, final_pointer: impl Into<String>) {
        let final_pointer = final_pointer.into();
        let mut data = self.inner.borrow_mut();
        data.pointer = final_pointer.clone();
        data.resolved = true;
        for site in &data.sites {
            site.set_ref_pointer(final_pointer.clone());
        }
        debug!(
            pointer = %final_pointer,
            sites = data.sites.len(),
            "resolved reference"
        );
    }

    /// Independent copy whose site list is copied, not shared
    pub(crate) fn clone_detached(&self) -> Ref {
        let data = self.inner.borrow();
        Ref {
            inner: Rc::new(RefCell::new(RefData {
                name: data.name.clone(),
                pointer: data.pointer.clone(),
                resolved: data.resolved,
                sites: data.sites.clone(),
                handle: data.handle.clone(),
            })),
        }
    }
}

/// A deferred binding between a requested type and its eventual node
#[derive(Clone, Debug)]
pub struct ForwardReference {
    inner: Rc<RefCell<ForwardRefData>>,
}

#[derive(Debug)]
struct ForwardRefData {
    namespace: String,
    type_name: String,
    reference: Ref,
    /// Root of the document that first requested the type
    requesting_schema: SchemaNode,
}

impl ForwardReference {
    /// Create a pending binding for `(namespace, type_name)`
    ///
    /// The embedded [`Ref`] is seeded with a provisional same-document
    /// pointer; resolution rewrites every site to the final one.
    pub fn new(
        namespace: impl Into<String>,
        type_name: impl Into<String>,
        requesting_schema: SchemaNode,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let type_name = type_name.into();
        let reference = Ref::new(
            RefOptions::new()
                .with_name(&type_name)
                .with_forward_reference(ForwardRefHandle::new(&namespace, &type_name)),
        )?;
        debug!(namespace = %namespace, type_name = %type_name, "created forward reference");
        Ok(Self {
            inner: Rc::new(RefCell::new(ForwardRefData {
                namespace,
                type_name,
                reference,
                requesting_schema,
            })),
        })
    }

    /// Target namespace URI
    pub fn namespace(&self) -> String {
        self.inner.borrow().namespace.clone()
    }

    /// Requested type name
    pub fn type_name(&self) -> String {
        self.inner.borrow().type_name.clone()
    }

    /// The shared reference whose sites get patched on resolution
    pub fn reference(&self) -> Ref {
        self.inner.borrow().reference.clone()
    }

    /// Root of the document that requested the type
    pub fn requesting_schema(&self) -> SchemaNode {
        self.inner.borrow().requesting_schema.clone()
    }

    /// Whether the binding has been resolved
    pub fn is_resolved(&self) -> bool {
        self.inner.borrow().reference.is_resolved()
    }

    /// Resolve the binding, patching every tracked site
    pub fn resolve(&self, final_pointer: impl Into<String>) {
        self.inner.borrow().reference.resolve(final_pointer);
    }

    /// Independent copy whose reference site list is copied, not shared
    ///
    /// Sites materialized through the copy are attached to the parents
    /// passed to the copy, never to the original's.
    pub fn clone_pending(&self) -> ForwardReference {
        let data = self.inner.borrow();
        ForwardReference {
            inner: Rc::new(RefCell::new(ForwardRefData {
                namespace: data.namespace.clone(),
                type_name: data.type_name.clone(),
                reference: data.reference.clone_detached(),
                requesting_schema: data.requesting_schema.clone(),
            })),
        }
    }
}
