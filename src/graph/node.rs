use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a node, taken verbatim from the source document.
pub type NodeId = String;

/// Upper bound on positional binding pairs such as `From_0..From_9`.
pub const MAX_POSITIONAL_BINDINGS: usize = 10;

/// One flowchart element together with its outgoing transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Outgoing transitions in declaration order. The first one is the default path.
    pub transitions: Vec<Transition>,
}

/// The closed set of node variants a pipeline can contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Start(StartNode),
    Action(ActionNode),
    Decision { condition: String },
    Interaction { template: String },
    End { name: Option<String> },
}

/// An externally callable entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartNode {
    pub name: String,
    pub is_public: bool,
    pub is_form_handler: bool,
}

/// A pipelet invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Canonical kind used to pick an emitter, e.g. `retrieve-product`.
    pub kind: String,
    pub key_bindings: Vec<(String, String)>,
    pub config_properties: Vec<(String, String)>,
    pub has_error_branch: bool,
}

/// A directed edge to another node of the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub target: NodeId,
    pub label: Option<String>,
}

/// How a transition label is interpreted by the structurer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelClass {
    True,
    False,
    Error,
    Other,
    Unlabeled,
}

impl Transition {
    pub fn new(target: impl Into<NodeId>) -> Self {
        Self {
            target: target.into(),
            label: None,
        }
    }

    pub fn labeled(target: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: Some(label.into()),
        }
    }

    pub fn class(&self) -> LabelClass {
        let Some(label) = self.label.as_deref() else {
            return LabelClass::Unlabeled;
        };
        match label.trim().to_ascii_lowercase().as_str() {
            "" => LabelClass::Unlabeled,
            "true" | "yes" | "then" => LabelClass::True,
            "false" | "no" | "else" => LabelClass::False,
            "error" | "pipelet_error" => LabelClass::Error,
            _ => LabelClass::Other,
        }
    }

    pub fn is_error(&self) -> bool {
        self.class() == LabelClass::Error
    }
}

impl Node {
    pub fn start(&self) -> Option<&StartNode> {
        match &self.kind {
            NodeKind::Start(start) => Some(start),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&ActionNode> {
        match &self.kind {
            NodeKind::Action(action) => Some(action),
            _ => None,
        }
    }

    pub fn is_action_of(&self, kind: &str) -> bool {
        self.action().is_some_and(|a| a.kind == kind)
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Start(_) => "start",
            NodeKind::Action(_) => "action",
            NodeKind::Decision { .. } => "decision",
            NodeKind::Interaction { .. } => "interaction",
            NodeKind::End { .. } => "end",
        }
    }
}

impl ActionNode {
    pub fn binding(&self, key: &str) -> Option<&str> {
        lookup(&self.key_bindings, key)
    }

    pub fn config(&self, key: &str) -> Option<&str> {
        lookup(&self.config_properties, key)
    }

    /// Reads `<from>N` / `<to>N` binding pairs for `N` in `0..MAX_POSITIONAL_BINDINGS`.
    /// A slot is skipped unless both halves are present and non-empty.
    pub fn positional_pairs(&self, from_prefix: &str, to_prefix: &str) -> Vec<(&str, &str)> {
        (0..MAX_POSITIONAL_BINDINGS)
            .filter_map(|i| {
                let from = self.binding(&format!("{}{}", from_prefix, i))?;
                let to = self.binding(&format!("{}{}", to_prefix, i))?;
                (!from.trim().is_empty() && !to.trim().is_empty()).then_some((from, to))
            })
            .collect()
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Start(s) => write!(f, "Start '{}' [{}]", s.name, self.id),
            NodeKind::Action(a) => write!(f, "Action {} [{}]", a.kind, self.id),
            NodeKind::Decision { condition } => write!(f, "Decision ({}) [{}]", condition, self.id),
            NodeKind::Interaction { template } => {
                write!(f, "Interaction '{}' [{}]", template, self.id)
            }
            NodeKind::End { name: Some(name) } => write!(f, "End '{}' [{}]", name, self.id),
            NodeKind::End { name: None } => write!(f, "End [{}]", self.id),
        }
    }
}
