use super::kinds;
use super::node::{Node, NodeId, NodeKind, Transition};
use crate::error::{GraphError, ParseError};
use ahash::AHashSet;
use indexmap::IndexMap;
use std::collections::VecDeque;

/// An immutable, id-indexed pipeline graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Graph {
    name: String,
    nodes: IndexMap<NodeId, Node>,
}

impl Graph {
    /// Builds a graph from already decoded nodes, rejecting duplicate ids and
    /// transitions whose target does not exist.
    pub fn from_nodes(
        name: impl Into<String>,
        nodes: impl IntoIterator<Item = Node>,
    ) -> Result<Self, ParseError> {
        let mut map: IndexMap<NodeId, Node> = IndexMap::new();
        for node in nodes {
            if map.contains_key(&node.id) {
                return Err(ParseError::DuplicateNode { node_id: node.id });
            }
            map.insert(node.id.clone(), node);
        }

        for node in map.values() {
            if let Some(t) = node
                .transitions
                .iter()
                .find(|t| !map.contains_key(&t.target))
            {
                return Err(ParseError::DanglingTransition {
                    node_id: node.id.clone(),
                    target_id: t.target.clone(),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            nodes: map,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Result<&Node, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Start nodes in declaration order.
    pub fn start_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Start(_)))
    }

    /// Ids of the nodes with a transition into `id`, in declaration order.
    /// A node with several transitions into `id` is listed once.
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.transitions.iter().any(|t| t.target == id))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Whether `t` is a `loop-end` jumping back to a `loop-begin`. Such
    /// transitions close an iteration and are not part of the forward flow.
    pub fn is_loop_back(&self, from: &Node, t: &Transition) -> bool {
        from.is_action_of(kinds::LOOP_END)
            && self
                .node(&t.target)
                .is_ok_and(|n| n.is_action_of(kinds::LOOP_BEGIN))
    }

    /// Breadth-first traversal over every transition, starting at (and including) `start`.
    pub fn reachable_from(&self, start: &str) -> Result<Vec<&str>, GraphError> {
        let first = self.node(start)?;
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([first]);
        seen.insert(first.id.as_str());

        while let Some(node) = queue.pop_front() {
            order.push(node.id.as_str());
            for t in &node.transitions {
                if seen.insert(t.target.as_str()) {
                    queue.push_back(self.node(&t.target)?);
                }
            }
        }
        Ok(order)
    }
}
