//! XSD document handling
//!
//! This module provides the source-side document tree consumed by the
//! traversal engine: an owned, index-addressed node tree parsed from XSD
//! text with quick-xml. Nodes expose a kind code, local name, attribute
//! lookup, ordered children and a parent link; the document additionally
//! offers a simplified path query used for sibling lookahead.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Index of a node within its owning [`XsdDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw index value
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Node kind code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An element node
    Element,
    /// A text node
    Text,
    /// A comment node
    Comment,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Local name for elements, empty for text and comments
    name: String,
    /// Namespace prefix as written, if any
    prefix: Option<String>,
    attributes: IndexMap<String, String>,
    /// Character data for text and comment nodes
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn element(name: String, prefix: Option<String>, parent: Option<NodeId>) -> Self {
        Self {
            kind: NodeKind::Element,
            name,
            prefix,
            attributes: IndexMap::new(),
            text: String::new(),
            parent,
            children: Vec::new(),
        }
    }

    fn character_data(kind: NodeKind, text: String, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name: String::new(),
            prefix: None,
            attributes: IndexMap::new(),
            text,
            parent,
            children: Vec::new(),
        }
    }
}

/// An XSD source document as a navigable node tree
#[derive(Debug, Clone)]
pub struct XsdDocument {
    uri: String,
    nodes: Vec<NodeData>,
    root: NodeId,
    /// Namespace prefix declarations, empty-string key for the default
    namespaces: IndexMap<String, String>,
}

impl XsdDocument {
    /// Parse an XSD document from text
    ///
    /// `uri` identifies the document for error reporting and for keying the
    /// produced artifact map; loading the text is the caller's concern.
    pub fn parse(uri: impl Into<String>, xml: &str) -> Result<Self> {
        let uri = uri.into();
        let mut reader = Reader::from_str(xml);

        let mut nodes: Vec<NodeData> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut namespaces: IndexMap<String, String> = IndexMap::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let id = Self::push_element(&mut nodes, &stack, e, &mut namespaces)?;
                    if root.is_none() {
                        root = Some(id);
                    }
                    stack.push(id);
                }
                Ok(Event::Empty(ref e)) => {
                    let id = Self::push_element(&mut nodes, &stack, e, &mut namespaces)?;
                    if root.is_none() {
                        root = Some(id);
                    }
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(&parent) = stack.last() {
                        let text = t
                            .unescape()
                            .map_err(|e| Error::Xml(e.to_string()))?
                            .into_owned();
                        let id = NodeId(nodes.len());
                        nodes.push(NodeData::character_data(NodeKind::Text, text, Some(parent)));
                        nodes[parent.0].children.push(id);
                    }
                }
                Ok(Event::Comment(ref c)) => {
                    if let Some(&parent) = stack.last() {
                        let text = String::from_utf8_lossy(c.as_ref()).into_owned();
                        let id = NodeId(nodes.len());
                        nodes.push(NodeData::character_data(
                            NodeKind::Comment,
                            text,
                            Some(parent),
                        ));
                        nodes[parent.0].children.push(id);
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "{} at position {}: {}",
                        uri,
                        reader.buffer_position(),
                        e
                    )))
                }
            }
        }

        let root = root.ok_or_else(|| Error::Xml(format!("{}: no root element", uri)))?;
        Ok(Self {
            uri,
            nodes,
            root,
            namespaces,
        })
    }

    fn push_element(
        nodes: &mut Vec<NodeData>,
        stack: &[NodeId],
        e: &quick_xml::events::BytesStart<'_>,
        namespaces: &mut IndexMap<String, String>,
    ) -> Result<NodeId> {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let prefix = e
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
        let parent = stack.last().copied();

        let mut data = NodeData::element(name, prefix, parent);
        for attr in e.attributes() {
            let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
            let raw_key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(e.to_string()))?
                .into_owned();
            // xmlns declarations go to the document-level prefix map
            if raw_key == "xmlns" {
                namespaces.insert(String::new(), value);
            } else if let Some(declared) = raw_key.strip_prefix("xmlns:") {
                namespaces.insert(declared.to_string(), value);
            } else {
                let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                data.attributes.insert(key, value);
            }
        }

        let id = NodeId(nodes.len());
        nodes.push(data);
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    /// Document URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Namespace URI declared for a prefix (`None` prefix for the default)
    pub fn namespace_for_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        self.namespaces
            .get(prefix.unwrap_or(""))
            .map(|s| s.as_str())
    }

    /// The document's target namespace, if declared on the root
    pub fn target_namespace(&self) -> Option<&str> {
        self.attribute(self.root, "targetNamespace")
    }

    /// Resolve a possibly-prefixed name to `(namespace, local name)`
    ///
    /// Unprefixed names resolve against the default namespace declaration
    /// when present, otherwise against the document's target namespace.
    pub fn resolve_qname<'a>(&'a self, qname: &'a str) -> (Option<&'a str>, &'a str) {
        match qname.split_once(':') {
            Some((prefix, local)) => (self.namespace_for_prefix(Some(prefix)), local),
            None => {
                let namespace = self
                    .namespace_for_prefix(None)
                    .or_else(|| self.target_namespace());
                (namespace, qname)
            }
        }
    }

    /// Root element of the document
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes in the document
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node kind code
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.0].kind
    }

    /// Local name of an element node (empty for text and comments)
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Namespace prefix of an element node as written
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].prefix.as_deref()
    }

    /// Attribute value lookup by local name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(name).map(|s| s.as_str())
    }

    /// All attributes of a node in document order
    pub fn attributes(&self, id: NodeId) -> &IndexMap<String, String> {
        &self.nodes[id.0].attributes
    }

    /// Character data of a text or comment node
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Ordered child list of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of a node, `None` for the root
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Element-kind children of a node in document order
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c.0].kind == NodeKind::Element)
            .collect()
    }

    /// Concatenated descendant text with nested element tags rendered as
    /// literal markup, runs of whitespace collapsed, ends trimmed
    pub fn markup_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_markup(id, &mut out, true);
        collapse_whitespace(&out)
    }

    fn render_markup(&self, id: NodeId, out: &mut String, is_top: bool) {
        let data = &self.nodes[id.0];
        match data.kind {
            NodeKind::Text => out.push_str(&data.text),
            NodeKind::Comment => {}
            NodeKind::Element => {
                if !is_top {
                    out.push('<');
                    out.push_str(&data.name);
                    out.push('>');
                }
                for &child in &data.children {
                    self.render_markup(child, out, false);
                }
                if !is_top {
                    out.push_str("</");
                    out.push_str(&data.name);
                    out.push('>');
                }
            }
        }
    }

    /// Simplified path query over the document
    ///
    /// Supported expressions: `/a/b/c` (absolute path from the root, where
    /// the first step must match the root element), `//name` (all descendant
    /// elements with that local name), `*` as a wildcard step, and an
    /// optional trailing predicate `[@attr='value']` on any step.
    pub fn select(&self, path: &str) -> Vec<NodeId> {
        if let Some(rest) = path.strip_prefix("//") {
            let step = PathStep::parse(rest);
            let mut matches = Vec::new();
            self.collect_descendants(self.root, &step, &mut matches);
            // The root itself is a candidate for descendant-or-self search
            if step.matches(self, self.root) {
                matches.insert(0, self.root);
            }
            return matches;
        }

        let steps: Vec<PathStep> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(PathStep::parse)
            .collect();
        if steps.is_empty() {
            return Vec::new();
        }

        let mut current = vec![self.root];
        let mut first = true;
        for step in &steps {
            let mut next = Vec::new();
            for &node in &current {
                if first {
                    if step.matches(self, node) {
                        next.push(node);
                    }
                } else {
                    for child in self.element_children(node) {
                        if step.matches(self, child) {
                            next.push(child);
                        }
                    }
                }
            }
            current = next;
            first = false;
        }
        current
    }

    fn collect_descendants(&self, id: NodeId, step: &PathStep, out: &mut Vec<NodeId>) {
        for child in self.element_children(id) {
            if step.matches(self, child) {
                out.push(child);
            }
            self.collect_descendants(child, step, out);
        }
    }
}

/// A single step in a path expression
#[derive(Debug, Clone, PartialEq)]
struct PathStep {
    name: String,
    predicate: Option<(String, String)>,
}

impl PathStep {
    fn parse(step: &str) -> Self {
        if let Some(open) = step.find('[') {
            let name = step[..open].to_string();
            let inner = step[open + 1..].trim_end_matches(']');
            let predicate = inner
                .strip_prefix('@')
                .and_then(|p| p.split_once('='))
                .map(|(attr, value)| {
                    (attr.to_string(), value.trim_matches('\'').to_string())
                });
            Self { name, predicate }
        } else {
            Self {
                name: step.to_string(),
                predicate: None,
            }
        }
    }

    fn matches(&self, doc: &XsdDocument, id: NodeId) -> bool {
        if doc.kind(id) != NodeKind::Element {
            return false;
        }
        if self.name != "*" && doc.name(id) != self.name {
            return false;
        }
        match &self.predicate {
            Some((attr, value)) => doc.attribute(id, attr) == Some(value.as_str()),
            None => true,
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = true;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="http://example.com/ns">
    <xs:simpleType name="Char_20">
        <xs:annotation>
            <xs:documentation>A string of at most  20
                characters, see <b>notes</b>.</xs:documentation>
        </xs:annotation>
        <xs:restriction base="xs:string">
            <xs:maxLength value="20"/>
        </xs:restriction>
    </xs:simpleType>
    <!-- a comment -->
    <xs:element name="root" type="Char_20"/>
</xs:schema>"#;

    #[test]
    fn test_parse_basic_structure() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        let root = doc.root();

        assert_eq!(doc.kind(root), NodeKind::Element);
        assert_eq!(doc.name(root), "schema");
        assert_eq!(doc.prefix(root), Some("xs"));
        assert_eq!(
            doc.attribute(root, "targetNamespace"),
            Some("http://example.com/ns")
        );
        assert_eq!(doc.element_children(root).len(), 2);
    }

    #[test]
    fn test_parent_links() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        let root = doc.root();
        let simple_type = doc.element_children(root)[0];

        assert_eq!(doc.parent(simple_type), Some(root));
        assert_eq!(doc.parent(root), None);
        for child in doc.children(simple_type) {
            assert_eq!(doc.parent(*child), Some(simple_type));
        }
    }

    #[test]
    fn test_text_and_comment_nodes() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        let root = doc.root();
        let kinds: Vec<NodeKind> = doc.children(root).iter().map(|&c| doc.kind(c)).collect();
        assert!(kinds.contains(&NodeKind::Comment));
        assert!(kinds.contains(&NodeKind::Text));
    }

    #[test]
    fn test_markup_text() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        let docs = doc.select("//documentation");
        assert_eq!(docs.len(), 1);

        let text = doc.markup_text(docs[0]);
        assert_eq!(
            text,
            "A string of at most 20 characters, see <b>notes</b>."
        );
    }

    #[test]
    fn test_select_absolute() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        let hits = doc.select("/schema/simpleType/restriction");
        assert_eq!(hits.len(), 1);
        assert_eq!(doc.attribute(hits[0], "base"), Some("xs:string"));
    }

    #[test]
    fn test_select_with_predicate() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        let hits = doc.select("/schema/simpleType[@name='Char_20']");
        assert_eq!(hits.len(), 1);

        let misses = doc.select("/schema/simpleType[@name='Other']");
        assert!(misses.is_empty());
    }

    #[test]
    fn test_select_descendant() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        assert_eq!(doc.select("//maxLength").len(), 1);
        assert_eq!(doc.select("//element").len(), 1);
        assert!(doc.select("//nothing").is_empty());
    }

    #[test]
    fn test_no_root_is_error() {
        assert!(XsdDocument::parse("empty.xsd", "  <!-- nothing -->  ").is_err());
    }

    #[test]
    fn test_namespace_declarations() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        assert_eq!(
            doc.namespace_for_prefix(Some("xs")),
            Some("http://www.w3.org/2001/XMLSchema")
        );
        assert_eq!(doc.namespace_for_prefix(Some("other")), None);
        assert_eq!(doc.target_namespace(), Some("http://example.com/ns"));

        // xmlns attributes are not regular attributes
        assert!(doc.attribute(doc.root(), "xs").is_none());
    }

    #[test]
    fn test_resolve_qname() {
        let doc = XsdDocument::parse("sample.xsd", SAMPLE).unwrap();
        assert_eq!(
            doc.resolve_qname("xs:string"),
            (Some("http://www.w3.org/2001/XMLSchema"), "string")
        );
        // Unprefixed falls back to the target namespace
        assert_eq!(
            doc.resolve_qname("Char_20"),
            (Some("http://example.com/ns"), "Char_20")
        );
    }
}
