//! Namespace-scoped type registry
//!
//! The [`NamespaceManager`] owns the lifecycle of named types across a whole
//! conversion run: a per-namespace table of converted types, plus the
//! forward references created for types requested before their conversion
//! (including self and mutual recursion and types defined in documents
//! processed later). Resolution follows a two-phase discipline: optimistic
//! reference creation, deferred patch once the real type is registered.

use indexmap::IndexMap;
use tracing::{debug, warn};
use url::Url;

use crate::documents::XsdDocument;
use crate::error::{Error, Result, UnresolvedReferences};
use crate::jsonschema::{ForwardReference, Ref, SchemaNode};
use crate::names::validate_ncname;
use crate::{GLOBAL_ATTRIBUTES_NAMESPACE, XSD_NAMESPACE};

/// A single namespace's table of named types
#[derive(Debug, Default, Clone)]
pub struct Namespace {
    types: IndexMap<String, SchemaNode>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a converted type by name
    pub fn get_type(&self, name: &str) -> Option<&SchemaNode> {
        self.types.get(name)
    }

    /// Whether a type of this name has been converted
    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of converted types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Names of converted types in registration order
    pub fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }
}

/// Point-in-time copy of the registry state
///
/// Captured before a document's conversion and restored if that conversion
/// aborts, so a failed document's registrations and pending references do
/// not leak into the rest of the run.
#[derive(Debug)]
pub struct RegistrySnapshot {
    namespaces: IndexMap<String, Namespace>,
    forward_references: Vec<ForwardReference>,
}

/// Run-scoped registry of namespaces, types and forward references
#[derive(Debug)]
pub struct NamespaceManager {
    namespaces: IndexMap<String, Namespace>,
    forward_references: Vec<ForwardReference>,
}

impl NamespaceManager {
    /// Create a fresh manager for one conversion run
    ///
    /// Pre-seeded with the XML Schema namespace (built-in primitives) and
    /// the synthetic namespace holding global attribute declarations.
    pub fn new() -> Self {
        let mut namespaces = IndexMap::new();
        namespaces.insert(XSD_NAMESPACE.to_string(), Namespace::new());
        namespaces.insert(GLOBAL_ATTRIBUTES_NAMESPACE.to_string(), Namespace::new());
        Self {
            namespaces,
            forward_references: Vec::new(),
        }
    }

    /// Idempotently ensure a type table exists for `uri`
    pub fn add_namespace(&mut self, uri: impl Into<String>) {
        self.namespaces.entry(uri.into()).or_default();
    }

    /// Whether a namespace has been registered
    pub fn contains_namespace(&self, uri: &str) -> bool {
        self.namespaces.contains_key(uri)
    }

    /// Number of registered namespaces
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// The type table for `uri`
    ///
    /// Fails with [`Error::NotFound`] if the namespace was never added; the
    /// two reserved namespaces always exist.
    pub fn namespace(&self, uri: &str) -> Result<&Namespace> {
        self.namespaces
            .get(uri)
            .ok_or_else(|| Error::NotFound(format!("namespace '{}'", uri)))
    }

    /// Look up a converted type by `(namespace, name)`
    pub fn get_type(&self, namespace: &str, name: &str) -> Option<&SchemaNode> {
        self.namespaces.get(namespace)?.get_type(name)
    }

    /// Obtain a reference to a named type, deferring if not yet converted
    ///
    /// `type_name` may carry a namespace prefix, resolved against
    /// `source_doc`'s declarations (unprefixed names fall back to the
    /// document's target namespace). If the type is already converted the
    /// returned [`Ref`] is bound to its concrete node; otherwise a
    /// [`ForwardReference`] is created (or an existing pending one is
    /// shared) and its `Ref` returned, to be patched when the type is
    /// registered later in the run. Materializing the reference at a
    /// location is the caller's follow-up; `working_schema` identifies the
    /// requesting location for that purpose.
    pub fn get_type_reference(
        &mut self,
        type_name: &str,
        json_schema: &SchemaNode,
        working_schema: &SchemaNode,
        source_doc: &XsdDocument,
    ) -> Result<Ref> {
        let _ = working_schema;
        let (namespace, local) = source_doc.resolve_qname(type_name);
        let namespace = namespace.unwrap_or("").to_string();
        let local = local.to_string();
        self.reference_for(&namespace, &local, json_schema)
    }

    /// Obtain a reference to a global attribute declaration
    ///
    /// Global attributes live in the synthetic reserved namespace; the
    /// deferral behavior is the same as [`Self::get_type_reference`].
    pub fn get_attribute_reference(
        &mut self,
        name: &str,
        json_schema: &SchemaNode,
        working_schema: &SchemaNode,
        source_doc: &XsdDocument,
    ) -> Result<Ref> {
        let _ = (working_schema, source_doc);
        self.reference_for(GLOBAL_ATTRIBUTES_NAMESPACE, name, json_schema)
    }

    fn reference_for(
        &mut self,
        namespace: &str,
        local: &str,
        json_schema: &SchemaNode,
    ) -> Result<Ref> {
        let namespace = namespace.to_string();
        self.add_namespace(namespace.clone());

        if let Some(node) = self.get_type(&namespace, local) {
            let pointer = Self::pointer_to(node);
            let reference = Ref::new(
                crate::jsonschema::RefOptions::new()
                    .with_pointer(&pointer)
                    .with_forward_reference(crate::jsonschema::ForwardRefHandle::new(
                        &namespace, local,
                    )),
            )?;
            reference.resolve(pointer);
            return Ok(reference);
        }

        // Share one pending binding per (namespace, name) pair
        if let Some(existing) = self
            .forward_references
            .iter()
            .find(|f| f.namespace() == namespace && f.type_name() == local)
        {
            return Ok(existing.reference());
        }

        let forward = ForwardReference::new(&namespace, local, json_schema.clone())?;
        let mut provisional = String::from("#");
        for segment in Self::namespace_segments(&namespace) {
            provisional.push('/');
            provisional.push_str(&segment);
        }
        provisional.push('/');
        provisional.push_str(local);
        forward.reference().seed_pointer(provisional);

        let reference = forward.reference();
        self.forward_references.push(forward);
        Ok(reference)
    }

    /// Record the concrete node for `(namespace, name)`
    ///
    /// Resolves every pending forward reference for the pair, patching all
    /// of their tracked sites to the final pointer, before returning.
    pub fn register_type(
        &mut self,
        namespace: &str,
        name: &str,
        node: &SchemaNode,
    ) -> Result<()> {
        validate_ncname(name)?;

        let table = self.namespaces.entry(namespace.to_string()).or_default();
        if table.types.insert(name.to_string(), node.clone()).is_some() {
            warn!(namespace, name, "type registered twice, keeping the latest");
        }
        debug!(namespace, name, "registered type");

        let pointer = Self::pointer_to(node);
        let mut remaining = Vec::new();
        for forward in self.forward_references.drain(..) {
            if forward.namespace() == namespace && forward.type_name() == name {
                forward.resolve(&pointer);
            } else {
                remaining.push(forward);
            }
        }
        self.forward_references = remaining;
        Ok(())
    }

    /// Capture the current registry state
    ///
    /// Node and reference handles are shared with the live registry; the
    /// tables and the pending list themselves are independent copies.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            namespaces: self.namespaces.clone(),
            forward_references: self.forward_references.clone(),
        }
    }

    /// Restore a previously captured state
    ///
    /// Discards every namespace, type registration and forward reference
    /// made since the snapshot. A forward reference drained by a since-
    /// discarded registration returns to the pending list; its sites are
    /// patched again when the type is registered for real.
    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.namespaces = snapshot.namespaces;
        self.forward_references = snapshot.forward_references;
    }

    /// Number of forward references still pending
    pub fn pending_count(&self) -> usize {
        self.forward_references.len()
    }

    /// End-of-run check: every forward reference must have been resolved
    ///
    /// Any remainder is a hard conversion error naming every unresolved
    /// `(namespace, type)` pair.
    pub fn ensure_resolved(&self) -> Result<()> {
        if self.forward_references.is_empty() {
            return Ok(());
        }
        let pairs = self
            .forward_references
            .iter()
            .map(|f| (f.namespace(), f.type_name()))
            .collect();
        Err(Error::UnresolvedReference(UnresolvedReferences::new(pairs)))
    }

    /// Final, stable pointer to a registered node
    ///
    /// Composed from the owning document root's `id` (when present) and the
    /// node's pointer fragment within that document.
    fn pointer_to(node: &SchemaNode) -> String {
        let fragment = node.json_pointer();
        match node.target_schema().id() {
            Some(id) => format!("{}{}", id, fragment),
            None => fragment,
        }
    }

    /// Path segments a namespace URI contributes to pointer fragments
    ///
    /// URL namespaces contribute their host and path segments; other
    /// non-empty namespaces are used literally.
    pub fn namespace_segments(uri: &str) -> Vec<String> {
        if uri.is_empty() {
            return Vec::new();
        }
        if let Ok(url) = Url::parse(uri) {
            let mut segments = Vec::new();
            if let Some(host) = url.host_str() {
                segments.push(host.to_string());
            }
            segments.extend(
                url.path()
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string()),
            );
            if !segments.is_empty() {
                return segments;
            }
        }
        vec![uri.replace(['/', ':'], "_")]
    }
}

impl Default for NamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}
