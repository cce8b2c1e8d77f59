//! Unit tests for core pipeflow types.
mod common;
use common::*;
use pipeflow::error::{DefinitionError, GraphError};
use pipeflow::graph::LabelClass;
use pipeflow::prelude::*;

#[test]
fn test_warning_kind_display() {
    assert_eq!(WarningKind::DeadEndToErrorTemplate.to_string(), "dead-end-to-error-template");
    assert_eq!(WarningKind::UnstructurableRegion.to_string(), "unstructurable-region");
    assert_eq!(WarningKind::UnknownActionKind.to_string(), "unknown-action-kind");

    let warning = Warning::new("n4", WarningKind::UnreachableNode, "end node is not reachable");
    assert_eq!(warning.to_string(), "[unreachable-node] n4: end node is not reachable");
}

#[test]
fn test_module_ref_display() {
    let module = ModuleRef::from_path("dw/catalog/ProductMgr");
    assert_eq!(module.alias, "ProductMgr");
    assert_eq!(format!("{}", module), "ProductMgr (dw/catalog/ProductMgr)");
}

#[test]
fn test_transition_label_classes() {
    assert_eq!(Transition::new("a").class(), LabelClass::Unlabeled);
    assert_eq!(Transition::labeled("a", "TRUE").class(), LabelClass::True);
    assert_eq!(Transition::labeled("a", "no").class(), LabelClass::False);
    assert!(Transition::labeled("a", "error").is_error());
    assert!(!Transition::labeled("a", "next").is_error());
}

#[test]
fn test_display_block_tree() {
    let block = ControlFlowBlock::sequence(vec![
        ControlFlowBlock::IfElse {
            node_id: "d".to_string(),
            condition: "Flag".to_string(),
            then_block: Box::new(ControlFlowBlock::statement("a")),
            else_block: Some(Box::new(ControlFlowBlock::statement("b"))),
        },
        ControlFlowBlock::statement("e"),
    ]);

    let rendered = DisplayBlock { block: &block }.to_string();
    assert_eq!(
        rendered,
        "└── Sequence\n    ├── If (Flag) [d]\n    │   ├── Statement [a]\n    │   └── Statement [b]\n    └── Statement [e]\n"
    );
}

#[test]
fn test_from_blocks_unwraps_single_child() {
    let single = ControlFlowBlock::from_blocks(vec![ControlFlowBlock::statement("x")]);
    assert_eq!(single, ControlFlowBlock::statement("x"));
    assert!(ControlFlowBlock::from_blocks(vec![]).is_empty());
    assert!(!ControlFlowBlock::statement("x").is_empty());
}

#[test]
fn test_covered_ids_include_headers() {
    let block = ControlFlowBlock::Loop {
        node_id: "begin".to_string(),
        header: LoopHeader::Iterate {
            iterator_expr: "Items".to_string(),
            element_var: "Item".to_string(),
            end_id: "end".to_string(),
        },
        body: Box::new(ControlFlowBlock::statement("work")),
    };
    assert_eq!(block.covered_ids(), vec!["begin", "end", "work"]);
    assert_eq!(block.statement_ids(), vec!["work"]);
}

#[test]
fn test_graph_queries() {
    let graph = parse(TWO_STARTS_XML, "Cart").unwrap();

    let starts: Vec<_> = graph.start_nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(starts, vec!["show", "add"]);

    let mut feeders = graph.predecessors("page");
    feeders.sort_unstable();
    assert_eq!(feeders, vec!["calc", "orphan"]);

    let reached = graph.reachable_from("show").unwrap();
    assert!(reached.contains(&"page"));
    assert!(!reached.contains(&"orphan"));

    assert_eq!(
        graph.node("nope").unwrap_err(),
        GraphError::NodeNotFound("nope".to_string())
    );
}

#[test]
fn test_error_display() {
    let err = ParseError::DanglingTransition {
        node_id: "n1".to_string(),
        target_id: "n9".to_string(),
    };
    assert!(err.to_string().contains("n1"));
    assert!(err.to_string().contains("n9"));

    let err = GenerateError::UnexpectedNode {
        function: "Show".to_string(),
        node_id: "check".to_string(),
        expected: "start",
    };
    assert!(err.to_string().contains("not a start node"));

    let err = ConversionError::from(DefinitionError::ValidationError("empty".to_string()));
    assert_eq!(err.to_string(), "Invalid custom definition: empty");
}

#[test]
fn test_node_builders_agree_with_parser() {
    let built = Graph::from_nodes(
        "Diamond",
        vec![
            start("s", "Run", "d"),
            decision("d", "Flag", "a", "b"),
            end("a"),
            end("b"),
        ],
    )
    .unwrap();
    let xml = r#"<pipeline>
        <node id="s" type="start" name="Run" call-mode="public"><transition target="d"/></node>
        <node id="d" type="decision" condition="Flag">
            <transition target="a" label="true"/>
            <transition target="b" label="false"/>
        </node>
        <node id="a" type="end"/>
        <node id="b" type="end"/>
    </pipeline>"#;
    let parsed = parse(xml, "Diamond").unwrap();
    assert_eq!(built, parsed);
}

#[test]
fn test_loop_back_transitions() {
    let graph = parse(LOOP_XML, "Basket").unwrap();
    let next = graph.node("next").unwrap();
    let flags: Vec<_> = next
        .transitions
        .iter()
        .map(|t| (t.target.as_str(), graph.is_loop_back(next, t)))
        .collect();
    assert_eq!(flags, vec![("loop", true), ("done", false)]);

    let copy = graph.node("copy").unwrap();
    assert!(!graph.is_loop_back(copy, &copy.transitions[0]));
}
