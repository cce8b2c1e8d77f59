//! Tests for reading XML and JSON documents into a `Graph`.
mod common;
use common::*;
use pipeflow::definition::{NodeDefinition, PipelineDefinition, TransitionDefinition};
use pipeflow::error::{ConversionError, DefinitionError};
use pipeflow::graph::kinds;
use pipeflow::prelude::*;

#[test]
fn test_xml_document_is_parsed() {
    let graph = parse(PRODUCT_XML, "Product").expect("Failed to parse product XML");

    assert_eq!(graph.name(), "Product");
    assert_eq!(graph.len(), 5);
    let ids: Vec<_> = graph.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["start", "check", "fetch", "show", "missing"]);

    let start = graph.node("start").unwrap().start().unwrap();
    assert_eq!(start.name, "Show");
    assert!(start.is_public);
    assert!(!start.is_form_handler);

    let fetch = graph.node("fetch").unwrap().action().unwrap();
    assert_eq!(fetch.kind, kinds::RETRIEVE_PRODUCT);
    assert_eq!(fetch.binding("Product"), Some("Product"));
    assert!(!fetch.has_error_branch);
}

#[test]
fn test_json_and_xml_produce_the_same_graph() {
    let from_xml = parse(PRODUCT_XML, "Product").expect("xml");
    let from_json = parse(PRODUCT_JSON, "Product").expect("json");
    assert_eq!(from_xml, from_json);
}

#[test]
fn test_transition_labels_are_kept_in_order() {
    let graph = parse(PRODUCT_XML, "Product").unwrap();
    let check = graph.node("check").unwrap();
    assert_eq!(check.transitions[0], Transition::labeled("fetch", "true"));
    assert_eq!(check.transitions[1], Transition::labeled("missing", "false"));
}

#[test]
fn test_error_transition_marks_error_branch() {
    let graph = parse(ERROR_BRANCH_XML, "Order").unwrap();
    let fetch = graph.node("fetch").unwrap().action().unwrap();
    assert!(fetch.has_error_branch);
    assert_eq!(fetch.kind, kinds::RETRIEVE_ORDER);
}

#[test]
fn test_unknown_pipelets_keep_their_name() {
    let xml = r#"<pipeline>
        <node id="s" type="start" name="Go"><transition target="x"/></node>
        <node id="x" type="pipelet" pipelet="SendCarrierPigeon"/>
    </pipeline>"#;
    let graph = parse(xml, "Pigeon").unwrap();
    assert!(graph.node("x").unwrap().is_action_of("SendCarrierPigeon"));
}

#[test]
fn test_dangling_transition_is_fatal() {
    let xml = r#"<pipeline>
        <node id="s" type="start" name="Go"><transition target="nowhere"/></node>
    </pipeline>"#;
    assert_eq!(
        parse(xml, "Broken"),
        Err(ParseError::DanglingTransition {
            node_id: "s".to_string(),
            target_id: "nowhere".to_string(),
        })
    );
}

#[test]
fn test_duplicate_node_is_fatal() {
    let xml = r#"<pipeline>
        <node id="s" type="start" name="Go"/>
        <node id="s" type="end"/>
    </pipeline>"#;
    assert!(matches!(
        parse(xml, "Broken"),
        Err(ParseError::DuplicateNode { node_id }) if node_id == "s"
    ));
}

#[test]
fn test_unknown_node_type_is_fatal() {
    let xml = r#"<pipeline><node id="w" type="wormhole"/></pipeline>"#;
    assert!(matches!(
        parse(xml, "Broken"),
        Err(ParseError::UnknownNodeType { type_name, .. }) if type_name == "wormhole"
    ));
}

#[test]
fn test_missing_required_attributes() {
    let no_condition = r#"<pipeline><node id="d" type="decision"/></pipeline>"#;
    assert!(matches!(
        parse(no_condition, "Broken"),
        Err(ParseError::MissingAttribute { attribute, .. }) if attribute == "condition"
    ));

    let no_element = r#"<pipeline>
        <node id="l" type="pipelet" pipelet="Loop">
            <key-binding key="Iterator" alias="Items"/>
        </node>
    </pipeline>"#;
    assert!(matches!(
        parse(no_element, "Broken"),
        Err(ParseError::MissingAttribute { attribute, .. }) if attribute == "Element"
    ));

    let no_id = r#"<pipeline><node type="end"/></pipeline>"#;
    assert!(matches!(parse(no_id, "Broken"), Err(ParseError::MissingNodeId { .. })));
}

#[test]
fn test_malformed_documents() {
    assert!(matches!(parse("<pipeline>", "Bad"), Err(ParseError::XmlParseError(_))));
    assert!(matches!(parse("{ \"nodes\": [", "Bad"), Err(ParseError::JsonParseError(_))));
    assert_eq!(parse("nodes: []", "Bad"), Err(ParseError::UnknownFormat));
}

#[test]
fn test_assign_bindings_are_positional() {
    let xml = r#"<pipeline>
        <node id="a" type="pipelet" pipelet="Assign">
            <key-binding key="To_1" alias="Second"/>
            <key-binding key="From_1" alias="2"/>
            <key-binding key="From_0" alias="1"/>
            <key-binding key="To_0" alias="First"/>
        </node>
    </pipeline>"#;
    let graph = parse(xml, "Assign").unwrap();
    let assign = graph.node("a").unwrap().action().unwrap();
    assert_eq!(assign.positional_pairs("From_", "To_"), vec![("1", "First"), ("2", "Second")]);
}

struct Steps(Vec<(&'static str, Option<&'static str>)>);

impl IntoDefinition for Steps {
    fn into_definition(self) -> std::result::Result<PipelineDefinition, DefinitionError> {
        if self.0.is_empty() {
            return Err(DefinitionError::ValidationError("no steps".to_string()));
        }
        let nodes = self
            .0
            .into_iter()
            .map(|(id, next)| NodeDefinition {
                id: id.to_string(),
                node_type: "end".to_string(),
                transitions: next
                    .into_iter()
                    .map(|target| TransitionDefinition {
                        target: target.to_string(),
                        label: None,
                    })
                    .collect(),
                ..Default::default()
            })
            .collect();
        Ok(PipelineDefinition { name: None, nodes })
    }
}

#[test]
fn test_custom_definition_layout() {
    let graph = parse_definition(Steps(vec![("one", None)]), "Custom").unwrap();
    assert!(graph.contains("one"));

    let err = parse_definition(Steps(vec![]), "Custom").unwrap_err();
    assert!(matches!(err, ConversionError::Definition(_)));

    let err = parse_definition(Steps(vec![("one", Some("two"))]), "Custom").unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Parse {
            source: ParseError::DanglingTransition { .. },
            ..
        }
    ));
}
