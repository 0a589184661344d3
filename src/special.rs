//! Special case identification and rewriting
//!
//! Some XSD shapes have no direct JSON Schema equivalent. The canonical one
//! is an exclusive choice nested inside a sequence where members or the
//! choice itself are optional: presence of each member interacts with the
//! required-ness of its siblings. The identifier detects such shapes and
//! rewrites them into an equivalent combinator expression, keeping an
//! append-only audit log of every rewrite for diagnostics.

use serde::Serialize;
use tracing::debug;

use crate::documents::{NodeId, NodeKind, XsdDocument};
use crate::error::{Error, Result};
use crate::jsonschema::SchemaNode;
use crate::names::split_qname;

/// The kind of rewrite applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialCaseKind {
    /// A choice group rewritten into an `anyOf` of presence combinations
    AnyOfChoice,
}

/// One audit record of a handled special case
#[derive(Debug, Clone, Serialize)]
pub struct SpecialCaseRecord {
    /// Kind of rewrite
    pub kind: SpecialCaseKind,
    /// URI of the source document
    pub document: String,
    /// Local name of the source element that triggered the rewrite
    pub element: String,
    /// Pointer of the schema node that received the rewrite
    pub schema_pointer: String,
}

/// Stateless pattern matcher with an append-only audit log
#[derive(Debug, Default)]
pub struct SpecialCaseIdentifier {
    special_cases: Vec<SpecialCaseRecord>,
}

impl SpecialCaseIdentifier {
    /// Create an identifier with an empty audit log
    pub fn new() -> Self {
        Self::default()
    }

    /// The audit log of handled cases, in handling order
    pub fn special_cases(&self) -> &[SpecialCaseRecord] {
        &self.special_cases
    }

    /// Whether a group or member is optional
    ///
    /// A node is optional when it declares `minOccurs="0"`. Absent a node,
    /// `position_hint` 0 denotes "no node, assume optional" by convention
    /// for call sites that probe hypothetically; any other position without
    /// a node is not optional.
    pub fn is_optional(
        &self,
        node: Option<NodeId>,
        doc: &XsdDocument,
        position_hint: usize,
    ) -> bool {
        if position_hint == 0 {
            return true;
        }
        match node {
            Some(id) => doc.attribute(id, "minOccurs") == Some("0"),
            None => false,
        }
    }

    /// Count element-kind children, ignoring text and comment nodes
    pub fn count_non_text_nodes(&self, doc: &XsdDocument, children: &[NodeId]) -> usize {
        children
            .iter()
            .filter(|&&c| doc.kind(c) == NodeKind::Element)
            .count()
    }

    /// First candidate name that does not collide with existing siblings
    ///
    /// Returns `None` when the candidate sequence is empty — the base case
    /// of the collision-avoidance search — or when every candidate is taken.
    pub fn locate_new_name_type(
        &self,
        schema: &SchemaNode,
        candidates: &[String],
    ) -> Option<String> {
        candidates
            .iter()
            .find(|c| schema.property(c).is_none() && schema.sub_schema(c).is_none())
            .cloned()
    }

    /// Rewrite a choice group into an `anyOf` of presence combinations
    ///
    /// Enumerates the valid combinations of required siblings crossed with a
    /// zero-or-one selection among the choice members, and appends each as a
    /// required/forbidden pair to `schema`'s `anyOf`. Returns `Ok(false)` as
    /// a no-op when the choice has no applicable members; fails with
    /// [`Error::InvalidArgument`] when called with no schema context.
    pub fn generate_any_of_choice(
        &mut self,
        schema: Option<&SchemaNode>,
        doc: &XsdDocument,
        choice: NodeId,
    ) -> Result<bool> {
        let schema = schema.ok_or_else(|| {
            Error::InvalidArgument("generate_any_of_choice requires a schema context".to_string())
        })?;

        let members = self.member_names(schema, doc, choice);
        if members.is_empty() {
            return Ok(false);
        }

        let (siblings, choice_position) = self.required_siblings(doc, choice);
        let choice_optional = self.is_optional(Some(choice), doc, choice_position);

        let mut combinations: Vec<Vec<&str>> = Vec::new();
        if choice_optional {
            combinations.push(Vec::new());
        }
        for member in &members {
            combinations.push(vec![member.as_str()]);
        }

        for selected in &combinations {
            let combo = SchemaNode::new();
            for sibling in &siblings {
                combo.add_required(sibling.clone());
            }
            for member in selected {
                combo.add_required(*member);
            }

            let forbidden: Vec<&String> = members
                .iter()
                .filter(|m| !selected.contains(&m.as_str()))
                .collect();
            match forbidden.len() {
                0 => {}
                1 => {
                    let not = SchemaNode::new();
                    not.add_required(forbidden[0].clone());
                    combo.set_not(not);
                }
                _ => {
                    let not = SchemaNode::new();
                    for member in forbidden {
                        let branch = SchemaNode::new();
                        branch.add_required(member.clone());
                        not.push_any_of(branch);
                    }
                    combo.set_not(not);
                }
            }

            schema.push_any_of(combo);
        }

        debug!(
            document = doc.uri(),
            members = members.len(),
            combinations = combinations.len(),
            "rewrote choice into anyOf"
        );
        self.add_special_case(SpecialCaseKind::AnyOfChoice, doc, choice, schema);
        Ok(true)
    }

    /// Append an audit record; never fails, never drives control flow
    pub fn add_special_case(
        &mut self,
        kind: SpecialCaseKind,
        doc: &XsdDocument,
        node: NodeId,
        schema: &SchemaNode,
    ) {
        self.special_cases.push(SpecialCaseRecord {
            kind,
            document: doc.uri().to_string(),
            element: doc.name(node).to_string(),
            schema_pointer: schema.json_pointer(),
        });
    }

    /// Display names of a choice's member elements
    ///
    /// A member is named by its `name` attribute or the local part of its
    /// `ref`; a member with neither gets a synthesized non-colliding name.
    fn member_names(
        &self,
        schema: &SchemaNode,
        doc: &XsdDocument,
        choice: NodeId,
    ) -> Vec<String> {
        let mut names = Vec::new();
        for (index, child) in doc.element_children(choice).into_iter().enumerate() {
            if doc.name(child) != "element" {
                continue;
            }
            let name = doc
                .attribute(child, "name")
                .map(|n| n.to_string())
                .or_else(|| {
                    doc.attribute(child, "ref")
                        .map(|r| split_qname(r).1.to_string())
                })
                .or_else(|| {
                    let candidates: Vec<String> = (1..=3)
                        .map(|n| format!("option{}_{}", index + 1, n))
                        .collect();
                    self.locate_new_name_type(schema, &candidates)
                });
            if let Some(name) = name {
                names.push(name);
            }
        }
        names
    }

    /// Required sibling names and the choice's 1-based position among the
    /// parent group's element children
    fn required_siblings(&self, doc: &XsdDocument, choice: NodeId) -> (Vec<String>, usize) {
        let parent = match doc.parent(choice) {
            Some(p) => p,
            None => return (Vec::new(), 1),
        };

        let mut siblings = Vec::new();
        let mut choice_position = 1;
        for (index, child) in doc.element_children(parent).into_iter().enumerate() {
            if child == choice {
                choice_position = index + 1;
                continue;
            }
            if doc.name(child) != "element" {
                continue;
            }
            if self.is_optional(Some(child), doc, index + 1) {
                continue;
            }
            let name = doc
                .attribute(child, "name")
                .map(|n| n.to_string())
                .or_else(|| {
                    doc.attribute(child, "ref")
                        .map(|r| split_qname(r).1.to_string())
                });
            if let Some(name) = name {
                siblings.push(name);
            }
        }
        (siblings, choice_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHOICE_DOC: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:complexType name="Shipment">
            <xs:sequence>
                <xs:element name="id" type="xs:string"/>
                <xs:choice minOccurs="0">
                    <xs:element name="airport" type="xs:string" minOccurs="0"/>
                    <xs:element name="harbor" type="xs:string" minOccurs="0"/>
                </xs:choice>
                <xs:element name="weight" type="xs:int"/>
            </xs:sequence>
        </xs:complexType>
    </xs:schema>"#;

    fn choice_doc() -> (XsdDocument, NodeId) {
        let doc = XsdDocument::parse("choice.xsd", CHOICE_DOC).unwrap();
        let choice = doc.select("//choice")[0];
        (doc, choice)
    }

    #[test]
    fn test_is_optional_position_zero_sentinel() {
        let (doc, choice) = choice_doc();
        let identifier = SpecialCaseIdentifier::new();

        // Position 0 is always optional, node or no node
        assert!(identifier.is_optional(None, &doc, 0));
        assert!(identifier.is_optional(Some(choice), &doc, 0));

        // A missing node at a real position is not optional
        assert!(!identifier.is_optional(None, &doc, 1));
    }

    #[test]
    fn test_is_optional_reads_min_occurs() {
        let (doc, choice) = choice_doc();
        let identifier = SpecialCaseIdentifier::new();

        assert!(identifier.is_optional(Some(choice), &doc, 2));
        let id_element = doc.select("//element[@name='id']")[0];
        assert!(!identifier.is_optional(Some(id_element), &doc, 1));
    }

    #[test]
    fn test_count_non_text_nodes() {
        let (doc, choice) = choice_doc();
        let identifier = SpecialCaseIdentifier::new();

        // The choice's raw child list holds whitespace text nodes too
        let children = doc.children(choice);
        assert!(children.len() > 2);
        assert_eq!(identifier.count_non_text_nodes(&doc, children), 2);
    }

    #[test]
    fn test_locate_new_name_type_empty_candidates() {
        let identifier = SpecialCaseIdentifier::new();
        let schema = SchemaNode::new();
        assert_eq!(identifier.locate_new_name_type(&schema, &[]), None);
    }

    #[test]
    fn test_locate_new_name_type_skips_collisions() {
        let identifier = SpecialCaseIdentifier::new();
        let schema = SchemaNode::new();
        schema.add_property("taken", SchemaNode::new());

        let candidates = vec!["taken".to_string(), "free".to_string()];
        assert_eq!(
            identifier.locate_new_name_type(&schema, &candidates),
            Some("free".to_string())
        );
    }

    #[test]
    fn test_generate_any_of_choice_requires_schema() {
        let (doc, choice) = choice_doc();
        let mut identifier = SpecialCaseIdentifier::new();
        assert!(matches!(
            identifier.generate_any_of_choice(None, &doc, choice),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_generate_any_of_choice_empty_is_noop() {
        let doc = XsdDocument::parse(
            "empty.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:choice minOccurs="0"/>
            </xs:schema>"#,
        )
        .unwrap();
        let choice = doc.select("//choice")[0];
        let mut identifier = SpecialCaseIdentifier::new();
        let schema = SchemaNode::new();

        let rewritten = identifier
            .generate_any_of_choice(Some(&schema), &doc, choice)
            .unwrap();
        assert!(!rewritten);
        assert!(schema.any_of().is_empty());
        assert!(identifier.special_cases().is_empty());
    }

    #[test]
    fn test_generate_any_of_choice_combinations() {
        let (doc, choice) = choice_doc();
        let mut identifier = SpecialCaseIdentifier::new();
        let schema = SchemaNode::new();

        let rewritten = identifier
            .generate_any_of_choice(Some(&schema), &doc, choice)
            .unwrap();
        assert!(rewritten);

        // Optional choice of two members: none, airport, harbor
        let any_of = schema.any_of();
        assert_eq!(any_of.len(), 3);

        // Every combination carries the required siblings
        for combo in &any_of {
            let required = combo.required();
            assert!(required.contains(&"id".to_string()));
            assert!(required.contains(&"weight".to_string()));
            // At most one choice member present
            let picked = ["airport", "harbor"]
                .iter()
                .filter(|m| required.contains(&m.to_string()))
                .count();
            assert!(picked <= 1);
        }

        // The none-selected combination forbids both members
        let none = &any_of[0];
        assert_eq!(none.required().len(), 2);
        let value = none.to_value();
        assert!(value["not"]["anyOf"].is_array());

        // A selected combination forbids exactly the other member
        let airport = &any_of[1];
        assert!(airport.required().contains(&"airport".to_string()));
        assert_eq!(airport.to_value()["not"]["required"][0], "harbor");

        // The rewrite was audited
        assert_eq!(identifier.special_cases().len(), 1);
        assert_eq!(identifier.special_cases()[0].kind, SpecialCaseKind::AnyOfChoice);
        assert_eq!(identifier.special_cases()[0].element, "choice");
    }
}
