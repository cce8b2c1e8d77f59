use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recoverable problem found while structuring or generating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Warning {
    pub node_id: NodeId,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningKind {
    /// A transition the structurer cannot use, or a missing branch.
    DanglingTransition,
    /// A node no entry point reaches.
    UnreachableNode,
    /// An error template reached from exactly one place and nothing else.
    DeadEndToErrorTemplate,
    /// A region emitted in discovery order instead of as structured blocks.
    UnstructurableRegion,
    /// A node emitted again along a second path.
    DuplicatedMerge,
    /// A start node that is also the target of a transition.
    StartReentry,
    /// An action whose kind has no registered emitter.
    UnknownActionKind,
}

impl Warning {
    pub fn new(node_id: impl Into<NodeId>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            message: message.into(),
        }
    }
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::DanglingTransition => "dangling-transition",
            WarningKind::UnreachableNode => "unreachable-node",
            WarningKind::DeadEndToErrorTemplate => "dead-end-to-error-template",
            WarningKind::UnstructurableRegion => "unstructurable-region",
            WarningKind::DuplicatedMerge => "duplicated-merge",
            WarningKind::StartReentry => "start-reentry",
            WarningKind::UnknownActionKind => "unknown-action-kind",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.node_id, self.message)
    }
}
