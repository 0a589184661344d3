//! JSON Schema tree nodes
//!
//! A [`SchemaNode`] is one node of the output document tree. Ownership runs
//! strictly parent-to-child through the keyword containers and the ordered
//! sub-schema map; `parent` and `target_schema` are weak back-references so
//! the tree remains a forest. The root's `target_schema` points at itself.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// JSON Schema primitive type keyword values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    /// `"array"`
    Array,
    /// `"boolean"`
    Boolean,
    /// `"integer"`
    Integer,
    /// `"number"`
    Number,
    /// `"null"`
    Null,
    /// `"object"`
    Object,
    /// `"string"`
    String,
}

impl JsonType {
    /// The keyword value as written in a schema document
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::Array => "array",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::Null => "null",
            JsonType::Object => "object",
            JsonType::String => "string",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seed configuration for a new node
///
/// Covers the keyword options a caller commonly supplies up front when
/// opening a document root or a type boundary.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    id: Option<String>,
    schema_uri: Option<String>,
    title: Option<String>,
    description: Option<String>,
    schema_type: Option<JsonType>,
}

impl NodeConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `id` keyword
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the `$schema` keyword
    pub fn with_schema_uri(mut self, uri: impl Into<String>) -> Self {
        self.schema_uri = Some(uri.into());
        self
    }

    /// Set the `title` keyword
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the `description` keyword
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the `type` keyword
    pub fn with_type(mut self, json_type: JsonType) -> Self {
        self.schema_type = Some(json_type);
        self
    }
}

#[derive(Debug, Default)]
struct NodeData {
    ref_pointer: Option<String>,
    id: Option<String>,
    schema_uri: Option<String>,
    title: Option<String>,
    description: Option<String>,
    default: Option<Value>,
    schema_type: Option<JsonType>,
    format: Option<String>,
    multiple_of: Option<Number>,
    maximum: Option<Number>,
    exclusive_maximum: bool,
    minimum: Option<Number>,
    exclusive_minimum: bool,
    max_length: Option<u64>,
    min_length: Option<u64>,
    pattern: Option<String>,
    items: Option<SchemaNode>,
    additional_items: Option<bool>,
    max_items: Option<u64>,
    min_items: Option<u64>,
    unique_items: bool,
    max_properties: Option<u64>,
    min_properties: Option<u64>,
    required: Vec<String>,
    properties: IndexMap<String, SchemaNode>,
    pattern_properties: IndexMap<String, SchemaNode>,
    additional_properties: Option<bool>,
    enum_values: Vec<Value>,
    all_of: Vec<SchemaNode>,
    any_of: Vec<SchemaNode>,
    one_of: Vec<SchemaNode>,
    not: Option<SchemaNode>,
    sub_schemas: IndexMap<String, SchemaNode>,
    parent: Weak<RefCell<NodeData>>,
    target_schema: Weak<RefCell<NodeData>>,
}

/// A node in the JSON Schema output tree
///
/// Cheap to clone as a handle; use [`SchemaNode::deep_clone`] for an
/// independent copy of a subtree.
#[derive(Clone)]
pub struct SchemaNode {
    inner: Rc<RefCell<NodeData>>,
}

impl SchemaNode {
    /// Create an empty node that is its own root
    pub fn new() -> Self {
        let node = Self {
            inner: Rc::new(RefCell::new(NodeData::default())),
        };
        node.inner.borrow_mut().target_schema = Rc::downgrade(&node.inner);
        node
    }

    /// Create a node seeded from a configuration of recognized options
    pub fn from_config(config: &NodeConfig) -> Self {
        let node = Self::new();
        {
            let mut data = node.inner.borrow_mut();
            data.id = config.id.clone();
            data.schema_uri = config.schema_uri.clone();
            data.title = config.title.clone();
            data.description = config.description.clone();
            data.schema_type = config.schema_type;
        }
        node
    }

    /// Whether two handles address the same node
    pub fn same_node(&self, other: &SchemaNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========== Back-references ==========

    /// The root of the tree this node currently belongs to
    ///
    /// Always resolvable: a detached node is its own root.
    pub fn target_schema(&self) -> SchemaNode {
        let weak = self.inner.borrow().target_schema.clone();
        match weak.upgrade() {
            Some(inner) => SchemaNode { inner },
            None => self.clone(),
        }
    }

    /// The parent node, `None` for a root
    pub fn parent(&self) -> Option<SchemaNode> {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .map(|inner| SchemaNode { inner })
    }

    /// Whether this node is the root of its own tree
    pub fn is_root(&self) -> bool {
        self.target_schema().same_node(self)
    }

    /// Adopt `child` (and its whole subtree) into this node's tree
    ///
    /// Sets the child's parent to this node and re-points `target_schema`
    /// throughout the child's subtree to this node's root. Placement into a
    /// keyword container is the caller's follow-up.
    pub(crate) fn adopt(&self, child: &SchemaNode) {
        child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        let root = self.target_schema();
        child.re_root(&root);
    }

    fn re_root(&self, root: &SchemaNode) {
        self.inner.borrow_mut().target_schema = Rc::downgrade(&root.inner);
        for child in self.owned_children() {
            child.re_root(root);
        }
    }

    fn owned_children(&self) -> Vec<SchemaNode> {
        let data = self.inner.borrow();
        let mut out = Vec::new();
        out.extend(data.properties.values().cloned());
        out.extend(data.pattern_properties.values().cloned());
        out.extend(data.sub_schemas.values().cloned());
        out.extend(data.all_of.iter().cloned());
        out.extend(data.any_of.iter().cloned());
        out.extend(data.one_of.iter().cloned());
        if let Some(items) = &data.items {
            out.push(items.clone());
        }
        if let Some(not) = &data.not {
            out.push(not.clone());
        }
        out
    }

    // ========== Keyword accessors ==========

    /// `$ref` pointer string
    pub fn ref_pointer(&self) -> Option<String> {
        self.inner.borrow().ref_pointer.clone()
    }

    /// Set the `$ref` pointer string
    pub fn set_ref_pointer(&self, pointer: impl Into<String>) {
        self.inner.borrow_mut().ref_pointer = Some(pointer.into());
    }

    /// `id` keyword
    pub fn id(&self) -> Option<String> {
        self.inner.borrow().id.clone()
    }

    /// Set the `id` keyword
    pub fn set_id(&self, id: impl Into<String>) {
        self.inner.borrow_mut().id = Some(id.into());
    }

    /// Set the `$schema` keyword
    pub fn set_schema_uri(&self, uri: impl Into<String>) {
        self.inner.borrow_mut().schema_uri = Some(uri.into());
    }

    /// `title` keyword
    pub fn title(&self) -> Option<String> {
        self.inner.borrow().title.clone()
    }

    /// Set the `title` keyword
    pub fn set_title(&self, title: impl Into<String>) {
        self.inner.borrow_mut().title = Some(title.into());
    }

    /// `description` keyword
    pub fn description(&self) -> Option<String> {
        self.inner.borrow().description.clone()
    }

    /// Set the `description` keyword
    pub fn set_description(&self, description: impl Into<String>) {
        self.inner.borrow_mut().description = Some(description.into());
    }

    /// Set the `default` keyword
    pub fn set_default(&self, value: Value) {
        self.inner.borrow_mut().default = Some(value);
    }

    /// `type` keyword
    pub fn schema_type(&self) -> Option<JsonType> {
        self.inner.borrow().schema_type
    }

    /// Set the `type` keyword
    pub fn set_type(&self, json_type: JsonType) {
        self.inner.borrow_mut().schema_type = Some(json_type);
    }

    /// `format` keyword
    pub fn format(&self) -> Option<String> {
        self.inner.borrow().format.clone()
    }

    /// Set the `format` keyword
    pub fn set_format(&self, format: impl Into<String>) {
        self.inner.borrow_mut().format = Some(format.into());
    }

    /// Set the `multipleOf` keyword
    pub fn set_multiple_of(&self, value: Number) {
        self.inner.borrow_mut().multiple_of = Some(value);
    }

    /// Set the `maximum` keyword, with the draft-04 `exclusiveMaximum` flag
    pub fn set_maximum(&self, value: Number, exclusive: bool) {
        let mut data = self.inner.borrow_mut();
        data.maximum = Some(value);
        data.exclusive_maximum = exclusive;
    }

    /// Set the `minimum` keyword, with the draft-04 `exclusiveMinimum` flag
    pub fn set_minimum(&self, value: Number, exclusive: bool) {
        let mut data = self.inner.borrow_mut();
        data.minimum = Some(value);
        data.exclusive_minimum = exclusive;
    }

    /// `minLength` keyword
    pub fn min_length(&self) -> Option<u64> {
        self.inner.borrow().min_length
    }

    /// Set the `minLength` keyword
    pub fn set_min_length(&self, value: u64) {
        self.inner.borrow_mut().min_length = Some(value);
    }

    /// `maxLength` keyword
    pub fn max_length(&self) -> Option<u64> {
        self.inner.borrow().max_length
    }

    /// Set the `maxLength` keyword
    pub fn set_max_length(&self, value: u64) {
        self.inner.borrow_mut().max_length = Some(value);
    }

    /// Set the `pattern` keyword
    pub fn set_pattern(&self, pattern: impl Into<String>) {
        self.inner.borrow_mut().pattern = Some(pattern.into());
    }

    /// Set the `items` schema of an array node
    pub fn set_items(&self, items: SchemaNode) -> SchemaNode {
        self.adopt(&items);
        self.inner.borrow_mut().items = Some(items.clone());
        items
    }

    /// `items` schema, if any
    pub fn items(&self) -> Option<SchemaNode> {
        self.inner.borrow().items.clone()
    }

    /// Set the `minItems` keyword
    pub fn set_min_items(&self, value: u64) {
        self.inner.borrow_mut().min_items = Some(value);
    }

    /// Set the `maxItems` keyword
    pub fn set_max_items(&self, value: u64) {
        self.inner.borrow_mut().max_items = Some(value);
    }

    /// Set the `uniqueItems` keyword
    pub fn set_unique_items(&self, unique: bool) {
        self.inner.borrow_mut().unique_items = unique;
    }

    /// Names currently listed in `required`
    pub fn required(&self) -> Vec<String> {
        self.inner.borrow().required.clone()
    }

    /// Add a name to `required` (no duplicates)
    pub fn add_required(&self, name: impl Into<String>) {
        let name = name.into();
        let mut data = self.inner.borrow_mut();
        if !data.required.contains(&name) {
            data.required.push(name);
        }
    }

    /// Insert or replace a named property, adopting the subtree
    pub fn add_property(&self, name: impl Into<String>, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner.borrow_mut().properties.insert(name.into(), node.clone());
        node
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<SchemaNode> {
        self.inner.borrow().properties.get(name).cloned()
    }

    /// Names of all properties in insertion order
    pub fn property_names(&self) -> Vec<String> {
        self.inner.borrow().properties.keys().cloned().collect()
    }

    /// Insert or replace a pattern property, adopting the subtree
    pub fn add_pattern_property(&self, pattern: impl Into<String>, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner
            .borrow_mut()
            .pattern_properties
            .insert(pattern.into(), node.clone());
        node
    }

    /// Set the `additionalProperties` keyword
    pub fn set_additional_properties(&self, allowed: bool) {
        self.inner.borrow_mut().additional_properties = Some(allowed);
    }

    /// Set the `minProperties` keyword
    pub fn set_min_properties(&self, value: u64) {
        self.inner.borrow_mut().min_properties = Some(value);
    }

    /// Set the `maxProperties` keyword
    pub fn set_max_properties(&self, value: u64) {
        self.inner.borrow_mut().max_properties = Some(value);
    }

    /// Set the `additionalItems` keyword
    pub fn set_additional_items(&self, allowed: bool) {
        self.inner.borrow_mut().additional_items = Some(allowed);
    }

    /// Append a value to `enum`
    pub fn add_enum_value(&self, value: Value) {
        self.inner.borrow_mut().enum_values.push(value);
    }

    /// Values currently listed in `enum`
    pub fn enum_values(&self) -> Vec<Value> {
        self.inner.borrow().enum_values.clone()
    }

    /// Append a schema to `allOf`, adopting the subtree
    pub fn push_all_of(&self, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner.borrow_mut().all_of.push(node.clone());
        node
    }

    /// Schemas currently in `allOf`
    pub fn all_of(&self) -> Vec<SchemaNode> {
        self.inner.borrow().all_of.clone()
    }

    /// Append a schema to `anyOf`, adopting the subtree
    pub fn push_any_of(&self, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner.borrow_mut().any_of.push(node.clone());
        node
    }

    /// Schemas currently in `anyOf`
    pub fn any_of(&self) -> Vec<SchemaNode> {
        self.inner.borrow().any_of.clone()
    }

    /// Append a schema to `oneOf`, adopting the subtree
    pub fn push_one_of(&self, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner.borrow_mut().one_of.push(node.clone());
        node
    }

    /// Schemas currently in `oneOf`
    pub fn one_of(&self) -> Vec<SchemaNode> {
        self.inner.borrow().one_of.clone()
    }

    /// Set the `not` schema, adopting the subtree
    pub fn set_not(&self, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner.borrow_mut().not = Some(node.clone());
        node
    }

    // ========== Sub-schemas ==========

    /// Insert or replace a named sub-schema
    ///
    /// Sets the child's parent to this node and its `target_schema` (and
    /// that of every descendant) to this node's root, then returns the
    /// inserted child.
    pub fn set_sub_schema(&self, name: impl Into<String>, node: SchemaNode) -> SchemaNode {
        self.adopt(&node);
        self.inner
            .borrow_mut()
            .sub_schemas
            .insert(name.into(), node.clone());
        node
    }

    /// Look up a sub-schema by name
    pub fn sub_schema(&self, name: &str) -> Option<SchemaNode> {
        self.inner.borrow().sub_schemas.get(name).cloned()
    }

    /// Names of all sub-schemas in insertion order
    pub fn sub_schema_names(&self) -> Vec<String> {
        self.inner.borrow().sub_schemas.keys().cloned().collect()
    }

    /// Walk a path of sub-schema names, creating empty nodes along the way
    pub fn sub_schema_path(&self, segments: &[String]) -> SchemaNode {
        let mut current = self.clone();
        for segment in segments {
            let next = match current.sub_schema(segment) {
                Some(existing) => existing,
                None => current.set_sub_schema(segment.clone(), SchemaNode::new()),
            };
            current = next;
        }
        current
    }

    // ========== Pointers ==========

    /// JSON pointer fragment of this node within its tree
    ///
    /// Derived by walking the parent chain through the named sub-schema
    /// containers, e.g. `#/www.example.org/Char_20`.
    pub fn json_pointer(&self) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            if let Some(name) = parent.name_of_sub_schema(&current) {
                segments.push(name);
            }
            current = parent;
        }
        segments.reverse();
        let mut pointer = String::from("#");
        for segment in &segments {
            pointer.push('/');
            pointer.push_str(segment);
        }
        pointer
    }

    fn name_of_sub_schema(&self, child: &SchemaNode) -> Option<String> {
        let data = self.inner.borrow();
        data.sub_schemas
            .iter()
            .find(|(_, node)| Rc::ptr_eq(&node.inner, &child.inner))
            .map(|(name, _)| name.clone())
    }

    // ========== Cloning ==========

    /// Deep-copy this subtree
    ///
    /// Every node in the copy has a new identity; keyword values are
    /// preserved; the copy's `target_schema` back-references point at the
    /// copy's own root and parent linkage exists only within the copy.
    pub fn deep_clone(&self) -> SchemaNode {
        let clone = self.copy_subtree();
        clone.re_root(&clone);
        clone
    }

    fn copy_subtree(&self) -> SchemaNode {
        let clone = SchemaNode::new();
        {
            let data = self.inner.borrow();
            let mut out = clone.inner.borrow_mut();
            out.ref_pointer = data.ref_pointer.clone();
            out.id = data.id.clone();
            out.schema_uri = data.schema_uri.clone();
            out.title = data.title.clone();
            out.description = data.description.clone();
            out.default = data.default.clone();
            out.schema_type = data.schema_type;
            out.format = data.format.clone();
            out.multiple_of = data.multiple_of.clone();
            out.maximum = data.maximum.clone();
            out.exclusive_maximum = data.exclusive_maximum;
            out.minimum = data.minimum.clone();
            out.exclusive_minimum = data.exclusive_minimum;
            out.max_length = data.max_length;
            out.min_length = data.min_length;
            out.pattern = data.pattern.clone();
            out.additional_items = data.additional_items;
            out.max_items = data.max_items;
            out.min_items = data.min_items;
            out.unique_items = data.unique_items;
            out.max_properties = data.max_properties;
            out.min_properties = data.min_properties;
            out.required = data.required.clone();
            out.additional_properties = data.additional_properties;
            out.enum_values = data.enum_values.clone();
        }

        let data = self.inner.borrow();
        for (name, child) in &data.properties {
            let copied = child.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone
                .inner
                .borrow_mut()
                .properties
                .insert(name.clone(), copied);
        }
        for (name, child) in &data.pattern_properties {
            let copied = child.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone
                .inner
                .borrow_mut()
                .pattern_properties
                .insert(name.clone(), copied);
        }
        for (name, child) in &data.sub_schemas {
            let copied = child.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone
                .inner
                .borrow_mut()
                .sub_schemas
                .insert(name.clone(), copied);
        }
        for child in &data.all_of {
            let copied = child.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone.inner.borrow_mut().all_of.push(copied);
        }
        for child in &data.any_of {
            let copied = child.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone.inner.borrow_mut().any_of.push(copied);
        }
        for child in &data.one_of {
            let copied = child.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone.inner.borrow_mut().one_of.push(copied);
        }
        if let Some(items) = &data.items {
            let copied = items.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone.inner.borrow_mut().items = Some(copied);
        }
        if let Some(not) = &data.not {
            let copied = not.copy_subtree();
            copied.inner.borrow_mut().parent = Rc::downgrade(&clone.inner);
            clone.inner.borrow_mut().not = Some(copied);
        }

        clone
    }

    /// Content equality, ignoring node identity
    pub fn content_eq(&self, other: &SchemaNode) -> bool {
        self.to_value() == other.to_value()
    }

    // ========== Serialization ==========

    /// Render this subtree as a plain `serde_json::Value`
    pub fn to_value(&self) -> Value {
        let data = self.inner.borrow();
        let mut map = Map::new();

        if let Some(v) = &data.ref_pointer {
            map.insert("$ref".into(), Value::String(v.clone()));
        }
        if let Some(v) = &data.schema_uri {
            map.insert("$schema".into(), Value::String(v.clone()));
        }
        if let Some(v) = &data.id {
            map.insert("id".into(), Value::String(v.clone()));
        }
        if let Some(v) = &data.title {
            map.insert("title".into(), Value::String(v.clone()));
        }
        if let Some(v) = &data.description {
            map.insert("description".into(), Value::String(v.clone()));
        }
        if let Some(v) = data.schema_type {
            map.insert("type".into(), Value::String(v.as_str().to_string()));
        }
        if let Some(v) = &data.format {
            map.insert("format".into(), Value::String(v.clone()));
        }
        if !data.enum_values.is_empty() {
            map.insert("enum".into(), Value::Array(data.enum_values.clone()));
        }
        if let Some(v) = &data.default {
            map.insert("default".into(), v.clone());
        }
        if let Some(v) = &data.multiple_of {
            map.insert("multipleOf".into(), Value::Number(v.clone()));
        }
        if let Some(v) = &data.maximum {
            map.insert("maximum".into(), Value::Number(v.clone()));
            if data.exclusive_maximum {
                map.insert("exclusiveMaximum".into(), Value::Bool(true));
            }
        }
        if let Some(v) = &data.minimum {
            map.insert("minimum".into(), Value::Number(v.clone()));
            if data.exclusive_minimum {
                map.insert("exclusiveMinimum".into(), Value::Bool(true));
            }
        }
        if let Some(v) = data.max_length {
            map.insert("maxLength".into(), Value::Number(v.into()));
        }
        if let Some(v) = data.min_length {
            map.insert("minLength".into(), Value::Number(v.into()));
        }
        if let Some(v) = &data.pattern {
            map.insert("pattern".into(), Value::String(v.clone()));
        }
        if let Some(items) = &data.items {
            map.insert("items".into(), items.to_value());
        }
        if let Some(v) = data.additional_items {
            map.insert("additionalItems".into(), Value::Bool(v));
        }
        if let Some(v) = data.max_items {
            map.insert("maxItems".into(), Value::Number(v.into()));
        }
        if let Some(v) = data.min_items {
            map.insert("minItems".into(), Value::Number(v.into()));
        }
        if data.unique_items {
            map.insert("uniqueItems".into(), Value::Bool(true));
        }
        if let Some(v) = data.max_properties {
            map.insert("maxProperties".into(), Value::Number(v.into()));
        }
        if let Some(v) = data.min_properties {
            map.insert("minProperties".into(), Value::Number(v.into()));
        }
        if !data.required.is_empty() {
            map.insert(
                "required".into(),
                Value::Array(
                    data.required
                        .iter()
                        .map(|s| Value::String(s.clone()))
                        .collect(),
                ),
            );
        }
        if !data.properties.is_empty() {
            let mut props = Map::new();
            for (name, node) in &data.properties {
                props.insert(name.clone(), node.to_value());
            }
            map.insert("properties".into(), Value::Object(props));
        }
        if !data.pattern_properties.is_empty() {
            let mut props = Map::new();
            for (pattern, node) in &data.pattern_properties {
                props.insert(pattern.clone(), node.to_value());
            }
            map.insert("patternProperties".into(), Value::Object(props));
        }
        if let Some(v) = data.additional_properties {
            map.insert("additionalProperties".into(), Value::Bool(v));
        }
        if !data.all_of.is_empty() {
            map.insert(
                "allOf".into(),
                Value::Array(data.all_of.iter().map(|n| n.to_value()).collect()),
            );
        }
        if !data.any_of.is_empty() {
            map.insert(
                "anyOf".into(),
                Value::Array(data.any_of.iter().map(|n| n.to_value()).collect()),
            );
        }
        if !data.one_of.is_empty() {
            map.insert(
                "oneOf".into(),
                Value::Array(data.one_of.iter().map(|n| n.to_value()).collect()),
            );
        }
        if let Some(not) = &data.not {
            map.insert("not".into(), not.to_value());
        }
        for (name, node) in &data.sub_schemas {
            map.insert(name.clone(), node.to_value());
        }

        Value::Object(map)
    }
}

impl Default for SchemaNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaNode({})", self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_node_is_own_root() {
        let node = SchemaNode::new();
        assert!(node.is_root());
        assert!(node.target_schema().same_node(&node));
        assert!(node.parent().is_none());
    }

    #[test]
    fn test_from_config() {
        let config = NodeConfig::new()
            .with_id("example.json")
            .with_schema_uri("http://json-schema.org/draft-04/schema#")
            .with_title("Example")
            .with_type(JsonType::Object);
        let node = SchemaNode::from_config(&config);

        let value = node.to_value();
        assert_eq!(value["id"], json!("example.json"));
        assert_eq!(value["title"], json!("Example"));
        assert_eq!(value["type"], json!("object"));
    }

    #[test]
    fn test_set_sub_schema_reroots_child() {
        let root = SchemaNode::new();
        let child = SchemaNode::new();
        let grandchild = SchemaNode::new();
        child.set_sub_schema("inner", grandchild.clone());

        let inserted = root.set_sub_schema("outer", child.clone());
        assert!(inserted.same_node(&child));
        assert!(child.parent().unwrap().same_node(&root));
        assert!(child.target_schema().same_node(&root));
        assert!(grandchild.target_schema().same_node(&root));
    }

    #[test]
    fn test_properties_and_required() {
        let node = SchemaNode::new();
        node.set_type(JsonType::Object);
        let prop = SchemaNode::new();
        prop.set_type(JsonType::String);
        node.add_property("name", prop);
        node.add_required("name");
        node.add_required("name");
        node.set_min_properties(1);
        node.set_max_properties(4);

        assert_eq!(node.required(), vec!["name".to_string()]);
        let value = node.to_value();
        assert_eq!(value["properties"]["name"]["type"], json!("string"));
        assert_eq!(value["required"], json!(["name"]));
        assert_eq!(value["minProperties"], json!(1));
        assert_eq!(value["maxProperties"], json!(4));
    }

    #[test]
    fn test_json_pointer() {
        let root = SchemaNode::new();
        let ns = root.sub_schema_path(&["www.example.org".to_string(), "sub".to_string()]);
        let typ = ns.set_sub_schema("Char_20", SchemaNode::new());

        assert_eq!(typ.json_pointer(), "#/www.example.org/sub/Char_20");
        assert_eq!(root.json_pointer(), "#");
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let root = SchemaNode::new();
        root.set_title("original");
        let child = root.set_sub_schema("Child", SchemaNode::new());
        child.set_type(JsonType::String);
        child.set_min_length(1);

        let clone = root.deep_clone();
        assert!(root.content_eq(&clone));
        assert!(!clone.same_node(&root));

        // Identity-distinct at every level
        let cloned_child = clone.sub_schema("Child").unwrap();
        assert!(!cloned_child.same_node(&child));

        // Back-references point into the clone only
        assert!(clone.is_root());
        assert!(cloned_child.target_schema().same_node(&clone));
        assert!(cloned_child.parent().unwrap().same_node(&clone));

        // No shared child containers
        clone.sub_schema("Child").unwrap().set_max_length(5);
        assert_eq!(child.max_length(), None);
        assert!(!root.content_eq(&clone));
    }

    #[test]
    fn test_deep_clone_preserves_combinators() {
        let node = SchemaNode::new();
        let branch = SchemaNode::new();
        branch.add_required("a");
        node.push_any_of(branch);
        let forbidden = SchemaNode::new();
        forbidden.add_required("b");
        let not = SchemaNode::new();
        not.set_not(forbidden);
        node.push_any_of(not);

        let clone = node.deep_clone();
        assert!(node.content_eq(&clone));
        assert_eq!(clone.any_of().len(), 2);
        assert!(clone.any_of()[0].target_schema().same_node(&clone));
    }

    #[test]
    fn test_to_value_numeric_bounds() {
        let node = SchemaNode::new();
        node.set_type(JsonType::Integer);
        node.set_minimum(Number::from(0), false);
        node.set_maximum(Number::from(100), true);

        let value = node.to_value();
        assert_eq!(value["minimum"], json!(0));
        assert_eq!(value["maximum"], json!(100));
        assert_eq!(value["exclusiveMaximum"], json!(true));
        assert!(value.get("exclusiveMinimum").is_none());
    }

    #[test]
    fn test_items_adopted() {
        let array = SchemaNode::new();
        array.set_type(JsonType::Array);
        let items = SchemaNode::new();
        items.set_type(JsonType::String);
        array.set_items(items.clone());

        assert!(items.parent().unwrap().same_node(&array));
        assert!(items.target_schema().same_node(&array));
    }
}
