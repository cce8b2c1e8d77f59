use crate::ast::{Warning, WarningKind};
use crate::graph::{Graph, Node, NodeKind};
use ahash::AHashSet;

/// Graph-level checks that do not depend on how a function was structured.
/// `reached` holds every node some entry point reaches structurally.
pub(super) fn lint_graph(graph: &Graph, reached: &AHashSet<&str>, error_templates: &[String]) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for node in graph.nodes() {
        if let Some(warning) = dead_end_to_error_template(graph, node, reached, error_templates) {
            warnings.push(warning);
        }
    }

    // Pages resume on a later request; the interaction already reported its
    // continuations as dangling, so the nodes behind them are not unreachable.
    let continued = continuations(graph, reached);
    for node in graph.nodes() {
        let id = node.id.as_str();
        if !reached.contains(id) && !continued.contains(id) && !matches!(node.kind, NodeKind::Start(_)) {
            warnings.push(Warning::new(
                node.id.clone(),
                WarningKind::UnreachableNode,
                format!("{} node is not reachable from any start node", node.type_name()),
            ));
        }
    }

    for start in graph.start_nodes() {
        let callers: Vec<&str> = graph
            .predecessors(&start.id)
            .into_iter()
            .filter(|p| reached.contains(p))
            .collect();
        if !callers.is_empty() {
            warnings.push(Warning::new(
                start.id.clone(),
                WarningKind::StartReentry,
                format!("start node is the target of transitions from {}", callers.join(", ")),
            ));
        }
    }

    warnings
}

/// Nodes reachable over any transition leaving a reached interaction.
fn continuations<'g>(graph: &'g Graph, reached: &AHashSet<&str>) -> AHashSet<&'g str> {
    let mut continued = AHashSet::new();
    let pages = graph
        .nodes()
        .filter(|n| matches!(n.kind, NodeKind::Interaction { .. }) && reached.contains(n.id.as_str()));
    for page in pages {
        for t in &page.transitions {
            if continued.contains(t.target.as_str()) {
                continue;
            }
            if let Ok(ids) = graph.reachable_from(&t.target) {
                continued.extend(ids);
            }
        }
    }
    continued
}

/// An error template whose only way in is a single node that can go nowhere else.
fn dead_end_to_error_template(
    graph: &Graph,
    node: &Node,
    reached: &AHashSet<&str>,
    error_templates: &[String],
) -> Option<Warning> {
    let NodeKind::Interaction { template } = &node.kind else {
        return None;
    };
    if !reached.contains(node.id.as_str()) || !error_templates.iter().any(|t| t == template) {
        return None;
    }

    let predecessors = graph.predecessors(&node.id);
    let [feeder] = predecessors.as_slice() else {
        return None;
    };
    let feeder = graph.node(feeder).ok()?;
    if !feeder.transitions.iter().all(|t| t.target == node.id) {
        return None;
    }

    Some(Warning::new(
        node.id.clone(),
        WarningKind::DeadEndToErrorTemplate,
        format!("'{}' only ever leads to error template '{}'", feeder.id, template),
    ))
}
