use crate::definition::{NodeDefinition, PipelineDefinition};
use crate::error::ParseError;
use crate::graph::kinds;
use crate::graph::{ActionNode, Graph, MAX_POSITIONAL_BINDINGS, Node, NodeKind, StartNode, Transition};

/// Decodes a raw definition into a validated graph named `definition_name`.
pub fn decode(definition: PipelineDefinition, definition_name: &str) -> Result<Graph, ParseError> {
    let nodes = definition
        .nodes
        .into_iter()
        .map(|node| decode_node(node, definition_name))
        .collect::<Result<Vec<_>, ParseError>>()?;
    Graph::from_nodes(definition_name, nodes)
}

fn decode_node(node: NodeDefinition, definition_name: &str) -> Result<Node, ParseError> {
    if node.id.trim().is_empty() {
        return Err(ParseError::MissingNodeId {
            definition: definition_name.to_string(),
        });
    }

    let transitions: Vec<Transition> = node
        .transitions
        .iter()
        .map(|t| Transition {
            target: t.target.clone(),
            label: t.label.clone().filter(|l| !l.trim().is_empty()),
        })
        .collect();

    let kind = match node.node_type.to_ascii_lowercase().as_str() {
        "start" | "start-node" => NodeKind::Start(StartNode {
            name: required(&node, "name")?.to_string(),
            is_public: node.attribute("call-mode").is_some_and(|m| m == "public")
                || node.attribute("public").is_some_and(is_truthy),
            is_form_handler: node.attribute("form-handler").is_some_and(is_truthy),
        }),
        "pipelet" | "pipelet-node" | "action" => {
            NodeKind::Action(decode_action(&node, &transitions)?)
        }
        "decision" | "decision-node" => NodeKind::Decision {
            condition: node
                .attribute("condition")
                .or_else(|| node.attribute("condition-key"))
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| missing(&node, "condition"))?
                .to_string(),
        },
        "interaction" | "interaction-node" | "template" => NodeKind::Interaction {
            template: required(&node, "template")?.to_string(),
        },
        "end" | "end-node" => NodeKind::End {
            name: node
                .attribute("name")
                .filter(|n| !n.trim().is_empty())
                .map(ToOwned::to_owned),
        },
        _ => {
            return Err(ParseError::UnknownNodeType {
                node_id: node.id,
                type_name: node.node_type,
            });
        }
    };

    Ok(Node {
        id: node.id,
        kind,
        transitions,
    })
}

fn decode_action(
    node: &NodeDefinition,
    transitions: &[Transition],
) -> Result<ActionNode, ParseError> {
    let pipelet = node
        .attribute("pipelet")
        .or_else(|| node.attribute("kind"))
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| missing(node, "pipelet"))?;
    let kind = kinds::canonical(pipelet).to_string();

    let mut key_bindings: Vec<(String, String)> = node
        .key_bindings
        .iter()
        .map(|b| (b.key.clone(), b.alias.clone()))
        .collect();
    if kind == kinds::ASSIGN {
        key_bindings = positional_order(key_bindings, "From_", "To_");
    }

    let action = ActionNode {
        kind,
        key_bindings,
        config_properties: node
            .config_properties
            .iter()
            .map(|c| (c.key.clone(), c.value.clone()))
            .collect(),
        has_error_branch: transitions.iter().any(Transition::is_error),
    };

    if action.kind == kinds::LOOP_BEGIN {
        for key in [kinds::LOOP_ITERATOR_KEY, kinds::LOOP_ELEMENT_KEY] {
            if action.binding(key).is_none_or(|v| v.trim().is_empty()) {
                return Err(missing(node, key));
            }
        }
    }
    Ok(action)
}

/// Reorders bindings so positional pairs come first (`From_0, To_0, From_1, ...`),
/// followed by every other binding in declaration order. Slots beyond
/// `MAX_POSITIONAL_BINDINGS` are kept with the non-positional bindings.
fn positional_order(
    bindings: Vec<(String, String)>,
    from_prefix: &str,
    to_prefix: &str,
) -> Vec<(String, String)> {
    let slot = |key: &str| -> Option<(usize, usize)> {
        let (side, index) = if let Some(rest) = key.strip_prefix(from_prefix) {
            (0, rest)
        } else {
            (1, key.strip_prefix(to_prefix)?)
        };
        let index: usize = index.parse().ok()?;
        (index < MAX_POSITIONAL_BINDINGS).then_some((index, side))
    };

    let (mut positional, rest): (Vec<_>, Vec<_>) =
        bindings.into_iter().partition(|(k, _)| slot(k).is_some());
    positional.sort_by_key(|(k, _)| slot(k));
    positional.extend(rest);
    positional
}

fn required<'a>(node: &'a NodeDefinition, attribute: &str) -> Result<&'a str, ParseError> {
    node.attribute(attribute)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(node, attribute))
}

fn missing(node: &NodeDefinition, attribute: &str) -> ParseError {
    ParseError::MissingAttribute {
        node_id: node.id.clone(),
        attribute: attribute.to_string(),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn positional_bindings_are_sorted_by_slot() {
        let ordered = positional_order(
            vec![
                pair("To_1", "b"),
                pair("Note", "x"),
                pair("From_1", "2"),
                pair("To_0", "a"),
                pair("From_0", "1"),
            ],
            "From_",
            "To_",
        );
        let keys: Vec<_> = ordered.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["From_0", "To_0", "From_1", "To_1", "Note"]);
    }

    #[test]
    fn slots_past_the_bound_are_not_positional() {
        let ordered = positional_order(
            vec![pair("From_10", "late"), pair("From_0", "1")],
            "From_",
            "To_",
        );
        assert_eq!(ordered[0].0, "From_0");
        assert_eq!(ordered[1].0, "From_10");
    }
}
