//! End-to-end conversion scenarios
//!
//! Each test feeds complete XSD documents through a full conversion run and
//! inspects the emitted JSON Schema trees.

use pretty_assertions::assert_eq;
use serde_json::json;
use xsd2jsonschema::{ConversionRun, Error, XsdDocument};

fn parse(uri: &str, xsd: &str) -> XsdDocument {
    XsdDocument::parse(uri, xsd).unwrap()
}

#[test]
fn restriction_chain_inherits_and_narrows() {
    // C restricts xs:string with minLength 1; Char_20 restricts C adding
    // maxLength 20. The derived type must carry both the inherited base
    // reference and its own narrowing.
    let doc = parse(
        "chars.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:c="http://www.example.org/chars"
                      targetNamespace="http://www.example.org/chars">
             <xs:simpleType name="C">
                 <xs:restriction base="xs:string">
                     <xs:minLength value="1"/>
                 </xs:restriction>
             </xs:simpleType>
             <xs:simpleType name="Char_20">
                 <xs:restriction base="c:C">
                     <xs:maxLength value="20"/>
                 </xs:restriction>
             </xs:simpleType>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc]).unwrap();
    assert!(outcome.is_complete());

    let value = outcome.schemas["chars.xsd"].to_value();
    let ns = &value["www.example.org"]["chars"];

    assert_eq!(ns["C"]["type"], json!("string"));
    assert_eq!(ns["C"]["minLength"], json!(1));

    let char_20 = &ns["Char_20"];
    assert_eq!(char_20["maxLength"], json!(20));
    assert_eq!(
        char_20["allOf"][0]["$ref"],
        json!("chars.json#/www.example.org/chars/C")
    );
}

#[test]
fn forward_reference_across_documents_resolves() {
    // Document A references a type that only document B, processed later,
    // defines. The reference must end up as a valid cross-document pointer
    // and the end-of-run check must find nothing pending.
    let doc_a = parse(
        "a.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:s="http://www.example.org/shared"
                      targetNamespace="http://www.example.org/shared">
             <xs:complexType name="Order">
                 <xs:sequence>
                     <xs:element name="customer" type="s:Customer"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );
    let doc_b = parse(
        "b.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://www.example.org/shared">
             <xs:complexType name="Customer">
                 <xs:sequence>
                     <xs:element name="name" type="xs:string"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc_a, doc_b]).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.schemas.len(), 2);

    let order = outcome.schemas["a.xsd"].to_value();
    let pointer = &order["www.example.org"]["shared"]["Order"]["properties"]["customer"]["$ref"];
    assert_eq!(pointer, &json!("b.json#/www.example.org/shared/Customer"));

    let customer = outcome.schemas["b.xsd"].to_value();
    assert_eq!(
        customer["www.example.org"]["shared"]["Customer"]["properties"]["name"]["type"],
        json!("string")
    );
}

#[test]
fn mutual_recursion_between_documents_resolves() {
    let doc_a = parse(
        "left.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:m="http://www.example.org/mutual"
                      targetNamespace="http://www.example.org/mutual">
             <xs:complexType name="Left">
                 <xs:sequence>
                     <xs:element name="right" type="m:Right" minOccurs="0"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );
    let doc_b = parse(
        "right.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:m="http://www.example.org/mutual"
                      targetNamespace="http://www.example.org/mutual">
             <xs:complexType name="Right">
                 <xs:sequence>
                     <xs:element name="left" type="m:Left" minOccurs="0"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc_a, doc_b]).unwrap();
    assert!(outcome.is_complete());

    let left = outcome.schemas["left.xsd"].to_value();
    assert_eq!(
        left["www.example.org"]["mutual"]["Left"]["properties"]["right"]["$ref"],
        json!("right.json#/www.example.org/mutual/Right")
    );
    let right = outcome.schemas["right.xsd"].to_value();
    assert_eq!(
        right["www.example.org"]["mutual"]["Right"]["properties"]["left"]["$ref"],
        json!("left.json#/www.example.org/mutual/Left")
    );
}

#[test]
fn optional_choice_in_sequence_rewritten_to_any_of() {
    // A sequence of required siblings around an optional exclusive choice
    // of two optional members: the valid presence combinations are "none",
    // "first only" and "second only", each alongside the required siblings.
    let doc = parse(
        "shipment.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://www.example.org/shipment">
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
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc]).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.special_cases.len(), 1);

    let value = outcome.schemas["shipment.xsd"].to_value();
    let shipment = &value["www.example.org"]["shipment"]["Shipment"];

    // The choice members still exist as (optional) properties
    assert_eq!(shipment["properties"]["airport"]["type"], json!("string"));
    assert_eq!(shipment["properties"]["harbor"]["type"], json!("string"));
    assert_eq!(shipment["required"], json!(["id", "weight"]));

    // One combination per valid presence pattern
    let any_of = shipment["anyOf"].as_array().unwrap();
    assert_eq!(any_of.len(), 3);

    for combo in any_of {
        let required: Vec<&str> = combo["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(required.contains(&"id"));
        assert!(required.contains(&"weight"));
        let picked = ["airport", "harbor"]
            .iter()
            .filter(|m| required.contains(*m))
            .count();
        assert!(picked <= 1, "more than one choice member in {:?}", required);
    }

    // The no-selection combination forbids both members
    assert_eq!(
        any_of[0]["not"]["anyOf"],
        json!([{ "required": ["airport"] }, { "required": ["harbor"] }])
    );
    // A selected combination forbids exactly the other member
    assert_eq!(any_of[1]["required"], json!(["id", "weight", "airport"]));
    assert_eq!(any_of[1]["not"], json!({ "required": ["harbor"] }));
}

#[test]
fn aborted_definition_does_not_satisfy_forward_references() {
    // Document A references t:Thing. The second document defines Thing but
    // aborts inside it, so the type it registered while unwinding must be
    // rolled back: with no real definition anywhere the run fails naming
    // the pair instead of resolving against a discarded node.
    let doc_a = parse(
        "a.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:t="http://www.example.org/things"
                      targetNamespace="http://www.example.org/things">
             <xs:complexType name="Holder">
                 <xs:sequence>
                     <xs:element name="thing" type="t:Thing"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );
    let doc_bad = parse(
        "bad.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://www.example.org/things">
             <xs:complexType name="Thing">
                 <xs:sequence>
                     <xs:element name="x" type="xs:string"/>
                     <xs:key name="k"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );

    let err = ConversionRun::new()
        .convert_all(&[doc_a, doc_bad])
        .unwrap_err();
    match err {
        Error::UnresolvedReference(agg) => {
            assert_eq!(agg.len(), 1);
            assert!(agg.pairs.contains(&(
                "http://www.example.org/things".to_string(),
                "Thing".to_string()
            )));
        }
        other => panic!("expected UnresolvedReference, got {}", other),
    }
}

#[test]
fn reference_resolves_to_later_real_definition_after_aborted_one() {
    // Same shape, but a third document really defines Thing: the reference
    // must point into that document, not at the aborted one's discarded
    // partial node.
    let doc_a = parse(
        "a.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:t="http://www.example.org/things"
                      targetNamespace="http://www.example.org/things">
             <xs:complexType name="Holder">
                 <xs:sequence>
                     <xs:element name="thing" type="t:Thing"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );
    let doc_bad = parse(
        "bad.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://www.example.org/things">
             <xs:complexType name="Thing">
                 <xs:sequence>
                     <xs:element name="x" type="xs:string"/>
                     <xs:key name="k"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );
    let doc_c = parse(
        "c.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://www.example.org/things">
             <xs:complexType name="Thing">
                 <xs:sequence>
                     <xs:element name="x" type="xs:string"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new()
        .convert_all(&[doc_a, doc_bad, doc_c])
        .unwrap();
    assert_eq!(outcome.schemas.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, "bad.xsd");

    let holder = outcome.schemas["a.xsd"].to_value();
    assert_eq!(
        holder["www.example.org"]["things"]["Holder"]["properties"]["thing"]["$ref"],
        json!("c.json#/www.example.org/things/Thing")
    );
}

#[test]
fn global_element_with_named_type() {
    let doc = parse(
        "root.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:r="http://www.example.org/root"
                      targetNamespace="http://www.example.org/root">
             <xs:complexType name="Body">
                 <xs:sequence>
                     <xs:element name="text" type="xs:string"/>
                 </xs:sequence>
             </xs:complexType>
             <xs:element name="message" type="r:Body"/>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc]).unwrap();
    assert!(outcome.is_complete());

    let value = outcome.schemas["root.xsd"].to_value();
    let message = &value["www.example.org"]["root"]["message"];
    assert_eq!(
        message["allOf"][0]["$ref"],
        json!("root.json#/www.example.org/root/Body")
    );
}

#[test]
fn element_referencing_global_element() {
    let doc = parse(
        "refs.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:r="http://www.example.org/refs"
                      targetNamespace="http://www.example.org/refs">
             <xs:element name="note" type="xs:string"/>
             <xs:complexType name="Envelope">
                 <xs:sequence>
                     <xs:element ref="r:note"/>
                 </xs:sequence>
             </xs:complexType>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc]).unwrap();
    assert!(outcome.is_complete());

    let value = outcome.schemas["refs.xsd"].to_value();
    let envelope = &value["www.example.org"]["refs"]["Envelope"];
    assert_eq!(
        envelope["properties"]["note"]["$ref"],
        json!("refs.json#/www.example.org/refs/note")
    );
    assert_eq!(envelope["required"], json!(["note"]));
}

#[test]
fn file_round_trip_through_disk() {
    // The same workflow the CLI drives: read XSD text from disk, convert,
    // write the pretty-printed JSON Schema next to it.
    let dir = tempfile::tempdir().unwrap();
    let xsd_path = dir.path().join("disk.xsd");
    std::fs::write(
        &xsd_path,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      targetNamespace="http://www.example.org/disk">
             <xs:simpleType name="Token">
                 <xs:restriction base="xs:string">
                     <xs:pattern value="[A-Z]{3}"/>
                 </xs:restriction>
             </xs:simpleType>
           </xs:schema>"#,
    )
    .unwrap();

    let text = std::fs::read_to_string(&xsd_path).unwrap();
    let doc = parse("disk.xsd", &text);
    let outcome = ConversionRun::new().convert_all(&[doc]).unwrap();

    let json_path = dir.path().join("disk.json");
    let pretty = serde_json::to_string_pretty(&outcome.schemas["disk.xsd"].to_value()).unwrap();
    std::fs::write(&json_path, &pretty).unwrap();

    let reloaded: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(reloaded["id"], json!("disk.json"));
    assert_eq!(
        reloaded["www.example.org"]["disk"]["Token"]["pattern"],
        json!("[A-Z]{3}")
    );
}

#[test]
fn extension_combines_base_and_own_content() {
    let doc = parse(
        "ext.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:e="http://www.example.org/ext"
                      targetNamespace="http://www.example.org/ext">
             <xs:complexType name="Base">
                 <xs:sequence>
                     <xs:element name="core" type="xs:string"/>
                 </xs:sequence>
             </xs:complexType>
             <xs:complexType name="Derived">
                 <xs:complexContent>
                     <xs:extension base="e:Base">
                         <xs:sequence>
                             <xs:element name="extra" type="xs:int"/>
                         </xs:sequence>
                     </xs:extension>
                 </xs:complexContent>
             </xs:complexType>
           </xs:schema>"#,
    );

    let outcome = ConversionRun::new().convert_all(&[doc]).unwrap();
    assert!(outcome.is_complete());

    let value = outcome.schemas["ext.xsd"].to_value();
    let derived = &value["www.example.org"]["ext"]["Derived"];
    assert_eq!(
        derived["allOf"][0]["$ref"],
        json!("ext.json#/www.example.org/ext/Base")
    );
    assert_eq!(derived["properties"]["extra"]["type"], json!("integer"));
    assert_eq!(derived["required"], json!(["extra"]));
}
