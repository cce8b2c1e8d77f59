use crate::ast::{Warning, WarningKind};
use crate::graph::{Graph, LabelClass, Node, NodeKind, Transition};
use ahash::AHashMap;
use std::collections::VecDeque;

/// The transitions the structurer actually follows out of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Exits {
    None,
    Next(usize),
    Branch {
        then: Option<usize>,
        otherwise: Option<usize>,
    },
    Guarded {
        success: Option<usize>,
        error: usize,
    },
}

impl Exits {
    fn targets(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(2);
        let mut push = |t: Option<usize>| {
            if let Some(t) = t {
                if !out.contains(&t) {
                    out.push(t);
                }
            }
        };
        match *self {
            Exits::None => {}
            Exits::Next(t) => push(Some(t)),
            Exits::Branch { then, otherwise } => {
                push(then);
                push(otherwise);
            }
            Exits::Guarded { success, error } => {
                push(success);
                push(Some(error));
            }
        }
        out
    }

    /// The path taken when the node completes normally.
    pub(super) fn primary(&self) -> Option<usize> {
        match *self {
            Exits::None => None,
            Exits::Next(t) => Some(t),
            Exits::Branch { then, .. } => then,
            Exits::Guarded { success, .. } => success,
        }
    }
}

/// Structural exits by target id, before indices are assigned.
enum RawExits<'g> {
    None,
    Next(&'g str),
    Branch {
        then: Option<&'g str>,
        otherwise: Option<&'g str>,
    },
    Guarded {
        success: Option<&'g str>,
        error: &'g str,
    },
}

/// The subgraph one entry point reaches, densely indexed in breadth-first
/// discovery order. Index 0 is the entry.
pub(super) struct FlowView<'g> {
    pub nodes: Vec<&'g Node>,
    pub exits: Vec<Exits>,
    pub succs: Vec<Vec<usize>>,
    pub preds: Vec<Vec<usize>>,
    pub warnings: Vec<Warning>,
}

impl<'g> FlowView<'g> {
    pub(super) fn build(graph: &'g Graph, entry: &'g Node) -> Self {
        let mut nodes: Vec<&'g Node> = vec![entry];
        let mut index: AHashMap<&'g str, usize> = AHashMap::new();
        index.insert(entry.id.as_str(), 0);
        let mut raw: Vec<RawExits<'g>> = Vec::new();
        let mut warnings = Vec::new();
        let mut queue = VecDeque::from([0usize]);

        while let Some(i) = queue.pop_front() {
            let node = nodes[i];
            let exits = structural_exits(graph, node, &mut warnings);
            for target in raw_targets(&exits) {
                if index.contains_key(target) {
                    continue;
                }
                // Targets were validated when the graph was built.
                let Ok(next) = graph.node(target) else {
                    continue;
                };
                index.insert(target, nodes.len());
                queue.push_back(nodes.len());
                nodes.push(next);
            }
            // Discovery is breadth-first, so `raw` is filled in index order.
            raw.push(exits);
        }

        let resolve = |id: &str| index.get(id).copied();
        let exits: Vec<Exits> = raw
            .iter()
            .map(|r| match *r {
                RawExits::None => Exits::None,
                RawExits::Next(t) => resolve(t).map_or(Exits::None, Exits::Next),
                RawExits::Branch { then, otherwise } => Exits::Branch {
                    then: then.and_then(resolve),
                    otherwise: otherwise.and_then(resolve),
                },
                RawExits::Guarded { success, error } => match resolve(error) {
                    Some(error) => Exits::Guarded {
                        success: success.and_then(resolve),
                        error,
                    },
                    None => success.and_then(resolve).map_or(Exits::None, Exits::Next),
                },
            })
            .collect();

        let succs: Vec<Vec<usize>> = exits.iter().map(Exits::targets).collect();
        let mut preds = vec![Vec::new(); nodes.len()];
        for (from, targets) in succs.iter().enumerate() {
            for &to in targets {
                preds[to].push(from);
            }
        }

        Self {
            nodes,
            exits,
            succs,
            preds,
            warnings,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) fn id(&self, i: usize) -> &'g str {
        &self.nodes[i].id
    }

    pub(super) fn is_action_of(&self, i: usize, kind: &str) -> bool {
        self.nodes[i].is_action_of(kind)
    }
}

fn raw_targets<'g>(exits: &RawExits<'g>) -> Vec<&'g str> {
    match *exits {
        RawExits::None => vec![],
        RawExits::Next(t) => vec![t],
        RawExits::Branch { then, otherwise } => then.into_iter().chain(otherwise).collect(),
        RawExits::Guarded { success, error } => success.into_iter().chain([error]).collect(),
    }
}

fn structural_exits<'g>(
    graph: &'g Graph,
    node: &'g Node,
    warnings: &mut Vec<Warning>,
) -> RawExits<'g> {
    let transitions = &node.transitions;
    let mut unused = |ignored: &[&Transition], reason: &str| {
        for t in ignored {
            warnings.push(Warning::new(
                node.id.clone(),
                WarningKind::DanglingTransition,
                format!("transition to '{}' ignored: {}", t.target, reason),
            ));
        }
    };

    match &node.kind {
        NodeKind::Start(_) => {
            let rest: Vec<_> = transitions.iter().skip(1).collect();
            unused(&rest, "a start node follows only its first transition");
            transitions
                .first()
                .map_or(RawExits::None, |t| RawExits::Next(&t.target))
        }
        NodeKind::End { .. } => {
            let all: Vec<_> = transitions.iter().collect();
            unused(&all, "end nodes terminate the flow");
            RawExits::None
        }
        NodeKind::Interaction { .. } => {
            let all: Vec<_> = transitions.iter().collect();
            unused(&all, "an interaction ends the request; its continuation runs in a later one");
            RawExits::None
        }
        NodeKind::Decision { .. } => {
            let mut then = None;
            let mut otherwise = None;
            let mut positional = Vec::new();
            let mut extra = Vec::new();
            for t in transitions {
                match t.class() {
                    LabelClass::True if then.is_none() => then = Some(t),
                    LabelClass::False if otherwise.is_none() => otherwise = Some(t),
                    LabelClass::True | LabelClass::False => extra.push(t),
                    _ => positional.push(t),
                }
            }
            let mut positional = positional.into_iter();
            if then.is_none() {
                then = positional.next();
            }
            if otherwise.is_none() {
                otherwise = positional.next();
            }
            extra.extend(positional);
            unused(&extra, "a decision has exactly two branches");
            for (branch, label) in [(then, "true"), (otherwise, "false")] {
                if branch.is_none() {
                    warnings.push(Warning::new(
                        node.id.clone(),
                        WarningKind::DanglingTransition,
                        format!("decision has no '{}' branch", label),
                    ));
                }
            }
            RawExits::Branch {
                then: then.map(|t| t.target.as_str()),
                otherwise: otherwise.map(|t| t.target.as_str()),
            }
        }
        NodeKind::Action(action) => {
            let mut success = None;
            let mut error = None;
            let mut extra = Vec::new();
            for t in transitions {
                if graph.is_loop_back(node, t) {
                    continue;
                }
                if t.is_error() && action.has_error_branch && error.is_none() {
                    error = Some(t);
                } else if !t.is_error() && success.is_none() {
                    success = Some(t);
                } else {
                    extra.push(t);
                }
            }
            unused(&extra, "an action has one success and at most one error transition");
            match (success, error) {
                (s, Some(e)) => RawExits::Guarded {
                    success: s.map(|t| t.target.as_str()),
                    error: &e.target,
                },
                (Some(s), None) => RawExits::Next(&s.target),
                (None, None) => RawExits::None,
            }
        }
    }
}
