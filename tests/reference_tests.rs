//! Reference, forward-reference and tree-model properties

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use xsd2jsonschema::jsonschema::{
    ForwardRefHandle, ForwardReference, JsonType, Ref, RefOptions, SchemaNode,
};
use xsd2jsonschema::{Error, NamespaceManager};

fn handle() -> ForwardRefHandle {
    ForwardRefHandle::new("http://www.example.org/ns", "Thing")
}

#[test]
fn ref_construction_accepts_exactly_one_source() {
    // name only, pointer only: valid
    assert!(Ref::new(
        RefOptions::new()
            .with_name("Thing")
            .with_forward_reference(handle())
    )
    .is_ok());
    assert!(Ref::new(
        RefOptions::new()
            .with_pointer("#/ns/Thing")
            .with_forward_reference(handle())
    )
    .is_ok());

    // neither, both, or a missing handle: invalid
    for options in [
        RefOptions::new().with_forward_reference(handle()),
        RefOptions::new()
            .with_name("Thing")
            .with_pointer("#/ns/Thing")
            .with_forward_reference(handle()),
        RefOptions::new().with_name("Thing"),
        RefOptions::new().with_pointer("#/ns/Thing"),
        RefOptions::new(),
    ] {
        assert!(matches!(
            Ref::new(options),
            Err(Error::InvalidArgument(_))
        ));
    }
}

proptest! {
    #[test]
    fn site_count_equals_materialization_count(calls in 1usize..24) {
        let reference = Ref::new(
            RefOptions::new()
                .with_name("Thing")
                .with_forward_reference(handle()),
        )
        .unwrap();

        let parents: Vec<SchemaNode> = (0..calls).map(|_| SchemaNode::new()).collect();
        for parent in &parents {
            reference.ref_to_schema(parent);
        }

        prop_assert_eq!(reference.site_count(), calls);
        let sites = reference.sites();
        for (site, parent) in sites.iter().zip(&parents) {
            prop_assert!(site.parent().unwrap().same_node(parent));
        }
    }

    #[test]
    fn resolution_patches_every_prior_site(before in 0usize..12, after in 0usize..6) {
        let reference = Ref::new(
            RefOptions::new()
                .with_name("Thing")
                .with_forward_reference(handle()),
        )
        .unwrap();
        let parent = SchemaNode::new();

        let early: Vec<SchemaNode> =
            (0..before).map(|_| reference.ref_to_schema(&parent)).collect();
        reference.resolve("final.json#/www.example.org/ns/Thing");
        let late: Vec<SchemaNode> =
            (0..after).map(|_| reference.ref_to_schema(&parent)).collect();

        for site in early.iter().chain(&late) {
            prop_assert_eq!(
                site.ref_pointer().unwrap(),
                "final.json#/www.example.org/ns/Thing"
            );
        }
        prop_assert_eq!(reference.site_count(), before + after);
    }

    #[test]
    fn clone_preserves_content_with_fresh_identity(
        title in "[a-z]{1,12}",
        children in 1usize..6,
    ) {
        let root = SchemaNode::new();
        root.set_title(title);
        root.set_type(JsonType::Object);
        for i in 0..children {
            let child = SchemaNode::new();
            child.set_type(JsonType::String);
            child.set_min_length(i as u64);
            root.set_sub_schema(format!("Child{}", i), child);
        }

        let clone = root.deep_clone();
        prop_assert!(root.content_eq(&clone));
        prop_assert!(!clone.same_node(&root));
        prop_assert!(clone.is_root());
        for i in 0..children {
            let name = format!("Child{}", i);
            let original = root.sub_schema(&name).unwrap();
            let copied = clone.sub_schema(&name).unwrap();
            prop_assert!(!copied.same_node(&original));
            prop_assert!(copied.target_schema().same_node(&clone));
        }
    }
}

#[test]
fn forward_reference_resolution_is_shared_through_clones_copy() {
    let requesting = SchemaNode::new();
    let forward =
        ForwardReference::new("http://www.example.org/ns", "Thing", requesting).unwrap();
    let parent = SchemaNode::new();
    let original_site = forward.reference().ref_to_schema(&parent);

    let copy = forward.clone_pending();
    assert_eq!(copy.namespace(), forward.namespace());
    assert_eq!(copy.type_name(), forward.type_name());

    // Resolving the original patches its own sites, not the copy's state
    forward.resolve("a.json#/ns/Thing");
    assert!(forward.is_resolved());
    assert!(!copy.is_resolved());
    assert_eq!(original_site.ref_pointer().unwrap(), "a.json#/ns/Thing");
}

#[test]
fn add_namespace_is_idempotent() {
    let mut manager = NamespaceManager::new();
    let before = manager.namespace_count();

    manager.add_namespace("http://www.example.org/twice");
    manager.add_namespace("http://www.example.org/twice");

    assert_eq!(manager.namespace_count(), before + 1);
    assert!(manager.namespace("http://www.example.org/twice").is_ok());
}

#[test]
fn clone_does_not_share_child_containers() {
    let root = SchemaNode::new();
    let inner = root.set_sub_schema("Inner", SchemaNode::new());
    inner.add_required("a");

    let clone = root.deep_clone();
    clone.sub_schema("Inner").unwrap().add_required("b");

    assert_eq!(inner.required(), vec!["a".to_string()]);
    assert_eq!(
        clone.sub_schema("Inner").unwrap().required(),
        vec!["a".to_string(), "b".to_string()]
    );
}
