//! The converting visitor
//!
//! [`Converter`] implements the traversal [`Visitor`] contract and maps each
//! XSD construct onto JSON Schema tree operations. It keeps a parsing-state
//! stack mirroring the lexical nesting of the source document; named type
//! boundaries opened during `visit` are registered with the
//! [`NamespaceManager`] when their closing boundary is exited.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use tracing::{debug, trace};

use crate::builtins::{BuiltinTypeMapper, Draft04TypeMapper};
use crate::conversion::ConversionConfig;
use crate::documents::{NodeId, XsdDocument};
use crate::error::{Error, Result, UnsupportedConstruct};
use crate::jsonschema::{JsonType, SchemaNode};
use crate::names::{split_qname, validate_ncname};
use crate::namespaces::{NamespaceManager, RegistrySnapshot};
use crate::special::{SpecialCaseIdentifier, SpecialCaseRecord};
use crate::traversal::Visitor;
use crate::{GLOBAL_ATTRIBUTES_NAMESPACE, XSD_NAMESPACE};

/// XSD element local names
mod tags {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const APPINFO: &str = "appinfo";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    // Facets
    pub const PATTERN: &str = "pattern";
    pub const ENUMERATION: &str = "enumeration";
    pub const MIN_LENGTH: &str = "minLength";
    pub const MAX_LENGTH: &str = "maxLength";
    pub const LENGTH: &str = "length";
    pub const MIN_INCLUSIVE: &str = "minInclusive";
    pub const MAX_INCLUSIVE: &str = "maxInclusive";
    pub const MIN_EXCLUSIVE: &str = "minExclusive";
    pub const MAX_EXCLUSIVE: &str = "maxExclusive";
    pub const TOTAL_DIGITS: &str = "totalDigits";
    pub const FRACTION_DIGITS: &str = "fractionDigits";
    pub const WHITE_SPACE: &str = "whiteSpace";
}

/// XSD attribute names
mod attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const USE: &str = "use";
    pub const DEFAULT: &str = "default";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const NAMESPACE: &str = "namespace";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
}

/// One frame of lexical context
#[derive(Debug, Default)]
struct StateFrame {
    name: String,
    /// Type boundary to register with the namespace manager on close
    register: Option<(String, String, SchemaNode)>,
    /// Working schema to restore on close
    saved_working: Option<Option<SchemaNode>>,
}

/// Stack of lexical context frames, strict LIFO
#[derive(Debug, Default)]
pub struct ParsingState {
    stack: Vec<StateFrame>,
}

impl ParsingState {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: impl Into<String>) {
        self.stack.push(StateFrame {
            name: name.into(),
            ..Default::default()
        });
    }

    fn pop(&mut self) -> Option<StateFrame> {
        self.stack.pop()
    }

    fn top_mut(&mut self) -> Option<&mut StateFrame> {
        self.stack.last_mut()
    }

    /// Current depth of the stack
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Tag of the node currently being visited
    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(|f| f.name.as_str())
    }

    /// Tag of the enclosing node, one frame below the current one
    pub fn parent_tag(&self) -> Option<&str> {
        if self.stack.len() < 2 {
            return None;
        }
        self.stack
            .get(self.stack.len() - 2)
            .map(|f| f.name.as_str())
    }

    /// Whether any enclosing frame carries the given tag
    pub fn within(&self, tag: &str) -> bool {
        self.stack.iter().any(|f| f.name == tag)
    }

    /// Whether the current context is inside a choice group
    pub fn in_choice(&self) -> bool {
        self.within(tags::CHOICE)
    }

    /// Whether the current context is inside a restriction
    pub fn in_restriction(&self) -> bool {
        self.within(tags::RESTRICTION)
    }
}

/// Stateful visitor converting one or more XSD documents
pub struct Converter {
    config: ConversionConfig,
    type_mapper: Box<dyn BuiltinTypeMapper>,
    namespace_manager: NamespaceManager,
    special: SpecialCaseIdentifier,
    parsing_state: ParsingState,
    /// The currently-open named type or property node
    working: Option<SchemaNode>,
    /// Target namespace of the document being walked
    target_namespace: String,
    /// Document URIs already processed in this run
    processed: HashSet<String>,
}

impl Converter {
    /// Create a converter with default configuration and the draft-04 mapper
    pub fn new() -> Self {
        Self::with_config(ConversionConfig::default())
    }

    /// Create a converter with a configuration
    pub fn with_config(config: ConversionConfig) -> Self {
        Self {
            config,
            type_mapper: Box::new(Draft04TypeMapper::new()),
            namespace_manager: NamespaceManager::new(),
            special: SpecialCaseIdentifier::new(),
            parsing_state: ParsingState::new(),
            working: None,
            target_namespace: String::new(),
            processed: HashSet::new(),
        }
    }

    /// Swap the built-in type mapper
    pub fn with_type_mapper(mut self, mapper: Box<dyn BuiltinTypeMapper>) -> Self {
        self.type_mapper = mapper;
        self
    }

    /// The run's namespace manager
    pub fn namespace_manager(&self) -> &NamespaceManager {
        &self.namespace_manager
    }

    /// Capture the registry state before a document is converted
    pub fn registry_snapshot(&self) -> RegistrySnapshot {
        self.namespace_manager.snapshot()
    }

    /// Discard every registry mutation made since the snapshot
    ///
    /// Called by the driver when a document's conversion aborts: the type
    /// boundaries registered while the error unwound, and any forward
    /// references the document created, must not survive it.
    pub fn restore_registry(&mut self, snapshot: RegistrySnapshot) {
        self.namespace_manager.restore(snapshot);
    }

    /// Audit log of special cases handled so far
    pub fn special_cases(&self) -> &[SpecialCaseRecord] {
        self.special.special_cases()
    }

    // ========== Helpers ==========

    fn unsupported(&self, doc: &XsdDocument, tag: &str, context: &str) -> Error {
        Error::UnsupportedConstruct(
            UnsupportedConstruct::new(tag, doc.uri()).with_context(context),
        )
    }

    fn working_schema(&self, doc: &XsdDocument, tag: &str) -> Result<SchemaNode> {
        self.working
            .clone()
            .ok_or_else(|| self.unsupported(doc, tag, "no enclosing type"))
    }

    /// Generated `id` for a document root, derived from the source URI
    fn schema_id(&self, uri: &str) -> String {
        let base = uri.rsplit('/').next().unwrap_or(uri);
        let stem = base.strip_suffix(".xsd").unwrap_or(base);
        format!("{}{}", stem, self.config.id_extension())
    }

    fn parse_number(&self, doc: &XsdDocument, value: &str) -> Result<Number> {
        let decimal: Decimal = value
            .trim()
            .parse()
            .map_err(|_| self.unsupported(doc, "facet", "non-numeric facet value"))?;
        if decimal.fract().is_zero() {
            if let Some(i) = decimal.to_i64() {
                return Ok(Number::from(i));
            }
        }
        decimal
            .to_f64()
            .and_then(Number::from_f64)
            .ok_or_else(|| self.unsupported(doc, "facet", "unrepresentable facet value"))
    }

    fn parse_length(&self, doc: &XsdDocument, node: NodeId, tag: &str) -> Result<u64> {
        let value = doc
            .attribute(node, attrs::VALUE)
            .ok_or_else(|| self.unsupported(doc, tag, "missing value attribute"))?;
        value
            .trim()
            .parse()
            .map_err(|_| self.unsupported(doc, tag, "invalid length value"))
    }

    /// `(minOccurs, maxOccurs)` of a particle, `None` meaning unbounded
    fn occurs(&self, doc: &XsdDocument, node: NodeId) -> Result<(u64, Option<u64>)> {
        let min = match doc.attribute(node, attrs::MIN_OCCURS) {
            Some(v) => v
                .parse()
                .map_err(|_| self.unsupported(doc, doc.name(node), "invalid minOccurs"))?,
            None => 1,
        };
        let max = match doc.attribute(node, attrs::MAX_OCCURS) {
            Some("unbounded") => None,
            Some(v) => Some(
                v.parse()
                    .map_err(|_| self.unsupported(doc, doc.name(node), "invalid maxOccurs"))?,
            ),
            None => Some(1),
        };
        Ok((min, max))
    }

    /// 1-based position of a node among its parent's element children
    fn position_of(&self, doc: &XsdDocument, node: NodeId) -> usize {
        doc.parent(node)
            .and_then(|p| {
                doc.element_children(p)
                    .iter()
                    .position(|&c| c == node)
                    .map(|i| i + 1)
            })
            .unwrap_or(1)
    }

    /// Build the node standing for a type reference at a location
    ///
    /// Built-in types become an inline typed node; named types become a
    /// `$ref` site obtained from the namespace manager, attached under
    /// `parent`.
    fn type_node_for(
        &mut self,
        type_name: &str,
        parent: &SchemaNode,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<SchemaNode> {
        let (ns, local) = doc.resolve_qname(type_name);
        if ns == Some(XSD_NAMESPACE) {
            let mapping = self
                .type_mapper
                .map(local)
                .ok_or_else(|| self.unsupported(doc, local, "unknown built-in type"))?;
            let node = SchemaNode::new();
            node.set_type(mapping.json_type);
            if let Some(format) = mapping.format {
                node.set_format(format);
            }
            Ok(node)
        } else {
            let reference =
                self.namespace_manager
                    .get_type_reference(type_name, json_schema, parent, doc)?;
            Ok(reference.ref_to_schema(parent))
        }
    }

    /// Open a registered boundary: mount the node under the namespace path
    /// and arrange registration when the current frame closes
    fn open_type_boundary(
        &mut self,
        namespace: &str,
        name: &str,
        json_schema: &SchemaNode,
        node: SchemaNode,
    ) -> SchemaNode {
        let segments = NamespaceManager::namespace_segments(namespace);
        let mount = json_schema.sub_schema_path(&segments);
        let node = mount.set_sub_schema(name, node);

        let saved = self.working.take();
        self.working = Some(node.clone());
        if let Some(frame) = self.parsing_state.top_mut() {
            frame.register = Some((namespace.to_string(), name.to_string(), node.clone()));
            frame.saved_working = Some(saved);
        }
        node
    }

    /// Switch the working schema for the duration of the current frame
    fn switch_working(&mut self, node: SchemaNode) {
        let saved = self.working.take();
        self.working = Some(node);
        if let Some(frame) = self.parsing_state.top_mut() {
            frame.saved_working = Some(saved);
        }
    }

    // ========== Handlers ==========

    fn handle_schema(&mut self, node: NodeId, doc: &XsdDocument) -> Result<bool> {
        let tns = doc
            .attribute(node, attrs::TARGET_NAMESPACE)
            .unwrap_or_default()
            .to_string();
        self.namespace_manager.add_namespace(tns.clone());
        self.target_namespace = tns;
        Ok(true)
    }

    fn handle_simple_type(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        let name = doc.attribute(node, attrs::NAME);
        if self.parsing_state.parent_tag() == Some(tags::SCHEMA) {
            let name = name
                .ok_or_else(|| self.unsupported(doc, tags::SIMPLE_TYPE, "unnamed global type"))?
                .to_string();
            validate_ncname(&name)?;
            let tns = self.target_namespace.clone();
            self.open_type_boundary(&tns, &name, json_schema, SchemaNode::new());
            return Ok(true);
        }

        // Anonymous: a union member opens a oneOf branch, other inline
        // simple types apply to the enclosing working schema
        if self.parsing_state.parent_tag() == Some(tags::UNION) {
            let working = self.working_schema(doc, tags::SIMPLE_TYPE)?;
            let branch = SchemaNode::new();
            working.push_one_of(branch.clone());
            self.switch_working(branch);
        }
        Ok(true)
    }

    fn handle_complex_type(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        if self.parsing_state.parent_tag() == Some(tags::SCHEMA) {
            let name = doc
                .attribute(node, attrs::NAME)
                .ok_or_else(|| self.unsupported(doc, tags::COMPLEX_TYPE, "unnamed global type"))?
                .to_string();
            validate_ncname(&name)?;
            let type_node = SchemaNode::new();
            type_node.set_type(JsonType::Object);
            let tns = self.target_namespace.clone();
            self.open_type_boundary(&tns, &name, json_schema, type_node);
            return Ok(true);
        }

        // Anonymous inline type: content applies to the enclosing node
        if let Some(working) = &self.working {
            working.set_type(JsonType::Object);
        }
        Ok(true)
    }

    fn handle_element(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        if self.parsing_state.parent_tag() == Some(tags::SCHEMA) {
            return self.handle_global_element(node, json_schema, doc);
        }

        let working = self.working_schema(doc, tags::ELEMENT)?;
        let type_attr = doc.attribute(node, attrs::TYPE).map(|s| s.to_string());
        let ref_attr = doc.attribute(node, attrs::REF).map(|s| s.to_string());
        let name = match (doc.attribute(node, attrs::NAME), &ref_attr) {
            (Some(name), _) => name.to_string(),
            (None, Some(r)) => split_qname(r).1.to_string(),
            (None, None) => {
                return Err(self.unsupported(doc, tags::ELEMENT, "element without name or ref"))
            }
        };

        let (min, max) = self.occurs(doc, node)?;
        let repeated = max.map_or(true, |m| m > 1);
        let reference_name = type_attr.or(ref_attr);

        let content = if repeated {
            let array = SchemaNode::new();
            array.set_type(JsonType::Array);
            let inner = match &reference_name {
                Some(t) => self.type_node_for(t, &array, json_schema, doc)?,
                None => SchemaNode::new(),
            };
            array.set_items(inner.clone());
            if min > 0 {
                array.set_min_items(min);
            }
            if let Some(m) = max {
                array.set_max_items(m);
            }
            working.add_property(&name, array);
            inner
        } else {
            let inner = match &reference_name {
                Some(t) => self.type_node_for(t, &working, json_schema, doc)?,
                None => SchemaNode::new(),
            };
            working.add_property(&name, inner.clone());
            inner
        };

        if let Some(default) = doc.attribute(node, attrs::DEFAULT) {
            content.set_default(Value::String(default.to_string()));
        }

        let position = self.position_of(doc, node);
        let optional = self.special.is_optional(Some(node), doc, position);
        if !optional && !self.parsing_state.in_choice() {
            working.add_required(&name);
        }

        self.switch_working(content);
        Ok(true)
    }

    fn handle_global_element(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        let name = doc
            .attribute(node, attrs::NAME)
            .ok_or_else(|| self.unsupported(doc, tags::ELEMENT, "global element without name"))?
            .to_string();
        validate_ncname(&name)?;

        let tns = self.target_namespace.clone();
        let el_node = self.open_type_boundary(&tns, &name, json_schema, SchemaNode::new());

        if let Some(type_attr) = doc.attribute(node, attrs::TYPE) {
            let (ns, local) = doc.resolve_qname(type_attr);
            if ns == Some(XSD_NAMESPACE) {
                let mapping = self
                    .type_mapper
                    .map(local)
                    .ok_or_else(|| self.unsupported(doc, local, "unknown built-in type"))?;
                el_node.set_type(mapping.json_type);
                if let Some(format) = mapping.format {
                    el_node.set_format(format);
                }
            } else {
                let type_attr = type_attr.to_string();
                let reference = self.namespace_manager.get_type_reference(
                    &type_attr,
                    json_schema,
                    &el_node,
                    doc,
                )?;
                let site = reference.ref_to_schema(&el_node);
                el_node.push_all_of(site);
            }
        }
        Ok(true)
    }

    fn handle_attribute(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        if self.parsing_state.parent_tag() == Some(tags::SCHEMA) {
            // Global attribute declarations live in the synthetic namespace
            let name = doc
                .attribute(node, attrs::NAME)
                .ok_or_else(|| {
                    self.unsupported(doc, tags::ATTRIBUTE, "global attribute without name")
                })?
                .to_string();
            validate_ncname(&name)?;
            let attr_node = self.open_type_boundary(
                GLOBAL_ATTRIBUTES_NAMESPACE,
                &name,
                json_schema,
                SchemaNode::new(),
            );
            if let Some(type_attr) = doc.attribute(node, attrs::TYPE) {
                let type_attr = type_attr.to_string();
                let typed = self.type_node_for(&type_attr, &attr_node, json_schema, doc)?;
                if typed.ref_pointer().is_some() {
                    attr_node.push_all_of(typed);
                } else if let Some(t) = typed.schema_type() {
                    attr_node.set_type(t);
                    if let Some(format) = typed.format() {
                        attr_node.set_format(format);
                    }
                }
            }
            return Ok(true);
        }

        let working = self.working_schema(doc, tags::ATTRIBUTE)?;
        let (property_name, content) = match (
            doc.attribute(node, attrs::NAME),
            doc.attribute(node, attrs::REF),
        ) {
            (Some(name), _) => {
                let property_name = format!("@{}", name);
                let content = match doc.attribute(node, attrs::TYPE) {
                    Some(type_attr) => {
                        let type_attr = type_attr.to_string();
                        self.type_node_for(&type_attr, &working, json_schema, doc)?
                    }
                    None => SchemaNode::new(),
                };
                working.add_property(&property_name, content.clone());
                (property_name, content)
            }
            (None, Some(ref_attr)) => {
                let local = split_qname(ref_attr).1.to_string();
                let property_name = format!("@{}", local);
                let reference = self.namespace_manager.get_attribute_reference(
                    &local,
                    json_schema,
                    &working,
                    doc,
                )?;
                let site = reference.ref_to_schema(&working);
                working.add_property(&property_name, site.clone());
                (property_name, site)
            }
            (None, None) => {
                return Err(self.unsupported(doc, tags::ATTRIBUTE, "attribute without name or ref"))
            }
        };

        if let Some(default) = doc.attribute(node, attrs::DEFAULT) {
            content.set_default(Value::String(default.to_string()));
        }
        if doc.attribute(node, attrs::USE) == Some("required") {
            working.add_required(&property_name);
        }

        self.switch_working(content);
        Ok(true)
    }

    fn handle_attribute_group(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        if self.parsing_state.parent_tag() == Some(tags::SCHEMA) {
            let name = doc
                .attribute(node, attrs::NAME)
                .ok_or_else(|| {
                    self.unsupported(doc, tags::ATTRIBUTE_GROUP, "unnamed attribute group")
                })?
                .to_string();
            validate_ncname(&name)?;
            let group_node = SchemaNode::new();
            group_node.set_type(JsonType::Object);
            let tns = self.target_namespace.clone();
            self.open_type_boundary(&tns, &name, json_schema, group_node);
            return Ok(true);
        }

        // A reference pulls the group definition into the enclosing type
        if let Some(ref_attr) = doc.attribute(node, attrs::REF) {
            let ref_attr = ref_attr.to_string();
            let working = self.working_schema(doc, tags::ATTRIBUTE_GROUP)?;
            let reference =
                self.namespace_manager
                    .get_type_reference(&ref_attr, json_schema, &working, doc)?;
            let site = reference.ref_to_schema(&working);
            working.push_all_of(site);
            return Ok(false);
        }
        Err(self.unsupported(doc, tags::ATTRIBUTE_GROUP, "attribute group without name or ref"))
    }

    fn handle_group(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        if self.parsing_state.parent_tag() == Some(tags::SCHEMA) {
            let name = doc
                .attribute(node, attrs::NAME)
                .ok_or_else(|| self.unsupported(doc, tags::GROUP, "unnamed group"))?
                .to_string();
            validate_ncname(&name)?;
            let group_node = SchemaNode::new();
            group_node.set_type(JsonType::Object);
            let tns = self.target_namespace.clone();
            self.open_type_boundary(&tns, &name, json_schema, group_node);
            return Ok(true);
        }

        if let Some(ref_attr) = doc.attribute(node, attrs::REF) {
            let ref_attr = ref_attr.to_string();
            let working = self.working_schema(doc, tags::GROUP)?;
            let reference =
                self.namespace_manager
                    .get_type_reference(&ref_attr, json_schema, &working, doc)?;
            let site = reference.ref_to_schema(&working);
            working.push_all_of(site);
            return Ok(false);
        }
        Err(self.unsupported(doc, tags::GROUP, "group without name or ref"))
    }

    fn handle_choice(&mut self, node: NodeId, doc: &XsdDocument) -> Result<bool> {
        let working = match &self.working {
            Some(w) => w.clone(),
            None => return Ok(true),
        };

        let members = doc.element_children(node);
        if self.special.count_non_text_nodes(doc, doc.children(node)) == 0 {
            return Ok(true);
        }

        let position = self.position_of(doc, node);
        let choice_optional = self.special.is_optional(Some(node), doc, position);
        let has_optional_member = members
            .iter()
            .enumerate()
            .any(|(i, &m)| self.special.is_optional(Some(m), doc, i + 1));

        if self.parsing_state.parent_tag() == Some(tags::SEQUENCE)
            && (choice_optional || has_optional_member)
        {
            self.special
                .generate_any_of_choice(Some(&working), doc, node)?;
        } else {
            // A plain exclusive choice: exactly one member present
            for member in &members {
                let member_name = doc
                    .attribute(*member, attrs::NAME)
                    .map(|n| n.to_string())
                    .or_else(|| {
                        doc.attribute(*member, attrs::REF)
                            .map(|r| split_qname(r).1.to_string())
                    });
                if let Some(member_name) = member_name {
                    let branch = SchemaNode::new();
                    branch.add_required(member_name);
                    working.push_one_of(branch);
                }
            }
        }
        Ok(true)
    }

    fn handle_restriction(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
        tag: &str,
    ) -> Result<bool> {
        let working = self.working_schema(doc, tag)?;
        if let Some(base) = doc.attribute(node, attrs::BASE) {
            let (ns, local) = doc.resolve_qname(base);
            if ns == Some(XSD_NAMESPACE) {
                let mapping = self
                    .type_mapper
                    .map(local)
                    .ok_or_else(|| self.unsupported(doc, local, "unknown built-in base type"))?;
                if working.schema_type().is_none() {
                    working.set_type(mapping.json_type);
                }
                if let Some(format) = mapping.format {
                    working.set_format(format);
                }
            } else {
                let base = base.to_string();
                let reference =
                    self.namespace_manager
                        .get_type_reference(&base, json_schema, &working, doc)?;
                let site = reference.ref_to_schema(&working);
                working.push_all_of(site);
            }
        }
        Ok(true)
    }

    fn handle_list(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        let working = self.working_schema(doc, tags::LIST)?;
        working.set_type(JsonType::Array);
        match doc.attribute(node, attrs::ITEM_TYPE) {
            Some(item_type) => {
                let item_type = item_type.to_string();
                let items = self.type_node_for(&item_type, &working, json_schema, doc)?;
                working.set_items(items);
                Ok(false)
            }
            None => {
                // Inline item type fills the items node
                let items = SchemaNode::new();
                working.set_items(items.clone());
                self.switch_working(items);
                Ok(true)
            }
        }
    }

    fn handle_union(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        let working = self.working_schema(doc, tags::UNION)?;
        if let Some(member_types) = doc.attribute(node, attrs::MEMBER_TYPES) {
            let names: Vec<String> = member_types
                .split_whitespace()
                .map(|s| s.to_string())
                .collect();
            for member in names {
                let branch = self.type_node_for(&member, &working, json_schema, doc)?;
                working.push_one_of(branch);
            }
        }
        // Inline member simple types add further oneOf branches
        Ok(true)
    }

    fn handle_documentation(&mut self, node: NodeId, json_schema: &SchemaNode, doc: &XsdDocument) {
        let text = doc.markup_text(node);
        if text.is_empty() {
            return;
        }
        let target = self.working.clone().unwrap_or_else(|| json_schema.clone());
        let description = match target.description() {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, text),
            _ => text,
        };
        target.set_description(description);
    }

    fn handle_enumeration(&mut self, node: NodeId, doc: &XsdDocument) -> Result<bool> {
        let working = self.working_schema(doc, tags::ENUMERATION)?;
        let value = doc
            .attribute(node, attrs::VALUE)
            .ok_or_else(|| self.unsupported(doc, tags::ENUMERATION, "missing value attribute"))?;

        let typed = match working.schema_type() {
            Some(JsonType::Integer) | Some(JsonType::Number) => {
                Value::Number(self.parse_number(doc, value)?)
            }
            Some(JsonType::Boolean) => Value::Bool(value == "true" || value == "1"),
            _ => Value::String(value.to_string()),
        };
        working.add_enum_value(typed);
        Ok(false)
    }

    fn handle_facet(&mut self, node: NodeId, doc: &XsdDocument, tag: &str) -> Result<bool> {
        let working = self.working_schema(doc, tag)?;
        match tag {
            tags::MIN_LENGTH => working.set_min_length(self.parse_length(doc, node, tag)?),
            tags::MAX_LENGTH => working.set_max_length(self.parse_length(doc, node, tag)?),
            tags::LENGTH => {
                let length = self.parse_length(doc, node, tag)?;
                working.set_min_length(length);
                working.set_max_length(length);
            }
            tags::PATTERN => {
                let value = doc
                    .attribute(node, attrs::VALUE)
                    .ok_or_else(|| self.unsupported(doc, tag, "missing value attribute"))?;
                working.set_pattern(value);
            }
            tags::MIN_INCLUSIVE | tags::MIN_EXCLUSIVE => {
                let value = doc
                    .attribute(node, attrs::VALUE)
                    .ok_or_else(|| self.unsupported(doc, tag, "missing value attribute"))?;
                let number = self.parse_number(doc, value)?;
                working.set_minimum(number, tag == tags::MIN_EXCLUSIVE);
            }
            tags::MAX_INCLUSIVE | tags::MAX_EXCLUSIVE => {
                let value = doc
                    .attribute(node, attrs::VALUE)
                    .ok_or_else(|| self.unsupported(doc, tag, "missing value attribute"))?;
                let number = self.parse_number(doc, value)?;
                working.set_maximum(number, tag == tags::MAX_EXCLUSIVE);
            }
            tags::FRACTION_DIGITS => {
                let digits: u32 = doc
                    .attribute(node, attrs::VALUE)
                    .and_then(|v| v.trim().parse().ok())
                    .ok_or_else(|| self.unsupported(doc, tag, "invalid fractionDigits value"))?;
                // 10^-d underflows to zero for large d; multipleOf must
                // stay positive
                let step = 10f64.powi(-(digits as i32));
                if step > 0.0 {
                    if let Some(step) = Number::from_f64(step) {
                        working.set_multiple_of(step);
                    }
                } else {
                    trace!(facet = tag, digits, "fractionDigits too large to map, skipped");
                }
            }
            tags::TOTAL_DIGITS | tags::WHITE_SPACE => {
                // No JSON Schema counterpart
                trace!(facet = tag, "facet has no mapping, skipped");
            }
            _ => return Err(self.unsupported(doc, tag, "unknown facet")),
        }
        Ok(false)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for Converter {
    fn on_begin(&mut self, json_schema: &SchemaNode, doc: &XsdDocument) -> bool {
        if !self.processed.insert(doc.uri().to_string()) {
            debug!(uri = doc.uri(), "document already processed, skipping");
            return false;
        }
        json_schema.set_schema_uri(self.config.draft_uri());
        json_schema.set_id(self.schema_id(doc.uri()));
        self.working = None;
        self.target_namespace = doc.target_namespace().unwrap_or_default().to_string();
        debug!(uri = doc.uri(), "begin conversion");
        true
    }

    fn enter_state(&mut self, node: NodeId, _json_schema: &SchemaNode, doc: &XsdDocument) {
        self.parsing_state.push(doc.name(node));
    }

    fn visit(
        &mut self,
        node: NodeId,
        json_schema: &SchemaNode,
        doc: &XsdDocument,
    ) -> Result<bool> {
        let namespace = doc.namespace_for_prefix(doc.prefix(node));
        if namespace != Some(XSD_NAMESPACE) {
            return Err(self.unsupported(doc, doc.name(node), "element outside the XSD namespace"));
        }

        let tag = doc.name(node).to_string();
        match tag.as_str() {
            tags::SCHEMA => self.handle_schema(node, doc),
            tags::SIMPLE_TYPE => self.handle_simple_type(node, json_schema, doc),
            tags::COMPLEX_TYPE => self.handle_complex_type(node, json_schema, doc),
            tags::ELEMENT => self.handle_element(node, json_schema, doc),
            tags::ATTRIBUTE => self.handle_attribute(node, json_schema, doc),
            tags::ATTRIBUTE_GROUP => self.handle_attribute_group(node, json_schema, doc),
            tags::GROUP => self.handle_group(node, json_schema, doc),
            tags::SEQUENCE | tags::ALL => Ok(true),
            tags::CHOICE => self.handle_choice(node, doc),
            tags::RESTRICTION | tags::EXTENSION => {
                self.handle_restriction(node, json_schema, doc, &tag)
            }
            tags::SIMPLE_CONTENT | tags::COMPLEX_CONTENT => Ok(true),
            tags::LIST => self.handle_list(node, json_schema, doc),
            tags::UNION => self.handle_union(node, json_schema, doc),
            tags::ANNOTATION => Ok(true),
            tags::DOCUMENTATION => {
                self.handle_documentation(node, json_schema, doc);
                Ok(false)
            }
            tags::APPINFO => Ok(false),
            tags::ENUMERATION => self.handle_enumeration(node, doc),
            tags::MIN_LENGTH
            | tags::MAX_LENGTH
            | tags::LENGTH
            | tags::PATTERN
            | tags::MIN_INCLUSIVE
            | tags::MAX_INCLUSIVE
            | tags::MIN_EXCLUSIVE
            | tags::MAX_EXCLUSIVE
            | tags::TOTAL_DIGITS
            | tags::FRACTION_DIGITS
            | tags::WHITE_SPACE => self.handle_facet(node, doc, &tag),
            tags::ANY | tags::ANY_ATTRIBUTE => {
                let target = self.working.clone().unwrap_or_else(|| json_schema.clone());
                target.set_additional_properties(true);
                Ok(false)
            }
            tags::IMPORT => {
                if let Some(ns) = doc.attribute(node, attrs::NAMESPACE) {
                    self.namespace_manager.add_namespace(ns);
                }
                Ok(false)
            }
            tags::INCLUDE => Ok(false),
            other => Err(self.unsupported(doc, other, "no conversion handler")),
        }
    }

    fn exit_state(&mut self) -> Result<()> {
        let frame = match self.parsing_state.pop() {
            Some(frame) => frame,
            None => return Ok(()),
        };
        if let Some(saved) = frame.saved_working {
            self.working = saved;
        }
        if let Some((namespace, name, node)) = frame.register {
            self.namespace_manager
                .register_type(&namespace, &name, &node)?;
        }
        Ok(())
    }

    fn on_end(&mut self, _json_schema: &SchemaNode, doc: &XsdDocument) {
        self.working = None;
        debug!(uri = doc.uri(), "end conversion");
    }
}
