use super::dominators::{immediate_dominators, immediate_post_dominators};
use super::loops::LoopInfo;
use super::view::{Exits, FlowView};
use crate::ast::{Annotation, ControlFlowBlock, LoopHeader, Warning, WarningKind};
use crate::graph::{NodeKind, kinds};
use ahash::AHashMap;
use std::collections::VecDeque;

/// Statements available to the whole walk, as a multiple of the reachable node count.
/// Everything past the first emission of each node is duplication.
const BUDGET_FACTOR: usize = 4;
const MIN_BUDGET: usize = 64;

/// Recovers a structured block tree from one entry point's view.
///
/// The walk follows successors in transition order and places every branching
/// node's continuation at its immediate post-dominator. Nodes reached again
/// outside such a merge are duplicated along the later path and reported.
pub(super) struct Structurer<'v, 'g> {
    view: &'v FlowView<'g>,
    ipdom: Vec<Option<usize>>,
    loops: LoopInfo,
    loop_ends: AHashMap<usize, Option<usize>>,
    claimed_ends: Vec<bool>,
    emitted: Vec<u32>,
    stops: Vec<usize>,
    active_loops: Vec<usize>,
    duplicating: bool,
    budget: usize,
    warnings: Vec<Warning>,
}

impl<'v, 'g> Structurer<'v, 'g> {
    pub(super) fn new(view: &'v FlowView<'g>) -> Self {
        let idom = immediate_dominators(&view.succs, 0);
        let loops = LoopInfo::analyze(&view.succs, &view.preds, &idom);
        let ipdom = immediate_post_dominators(&loops.forward);
        let n = view.len();
        Self {
            view,
            ipdom,
            loops,
            loop_ends: AHashMap::new(),
            claimed_ends: vec![false; n],
            emitted: vec![0; n],
            stops: Vec::new(),
            active_loops: Vec::new(),
            duplicating: false,
            budget: (n * BUDGET_FACTOR).max(MIN_BUDGET),
            warnings: Vec::new(),
        }
    }

    pub(super) fn run(mut self) -> (ControlFlowBlock, Vec<Warning>) {
        let mut blocks = self.region(0, None);

        let missed: Vec<usize> = (0..self.view.len())
            .filter(|&i| self.emitted[i] == 0)
            .collect();
        if let Some(&first) = missed.first() {
            tracing::trace!(nodes = missed.len(), "appending nodes the walk did not place");
            self.warn(
                first,
                WarningKind::UnstructurableRegion,
                format!("{} node(s) could not be placed and are appended in discovery order", missed.len()),
            );
            let statements = missed
                .iter()
                .filter(|&&i| !matches!(self.view.nodes[i].kind, NodeKind::Start(_)))
                .map(|&i| ControlFlowBlock::statement(self.view.id(i)))
                .collect();
            blocks.push(self.annotated(statements, first, WarningKind::UnstructurableRegion, "unplaced nodes"));
        }

        (ControlFlowBlock::from_blocks(blocks), self.warnings)
    }

    /// Structures the chain starting at `entry` until it reaches `stop`, an
    /// enclosing stop, an active loop header, or a terminal node.
    fn region(&mut self, entry: usize, stop: Option<usize>) -> Vec<ControlFlowBlock> {
        if let Some(stop) = stop {
            self.stops.push(stop);
        }
        let mut blocks = Vec::new();
        let mut current = Some(entry);

        while let Some(node) = current {
            if self.stops.contains(&node) || self.active_loops.contains(&node) {
                break;
            }
            if self.emitted[node] > 0 {
                if !self.duplicating {
                    blocks.push(self.duplicate(node));
                    break;
                }
                if self.budget == 0 {
                    blocks.push(self.omitted(node));
                    break;
                }
            }
            current = self.step(node, &mut blocks);
        }

        if stop.is_some() {
            self.stops.pop();
        }
        blocks
    }

    /// Re-emits the already placed chain starting at `node`.
    fn duplicate(&mut self, node: usize) -> ControlFlowBlock {
        if self.budget == 0 {
            return self.omitted(node);
        }
        tracing::trace!(node = self.view.id(node), "duplicating shared tail");
        self.duplicating = true;
        let blocks = self.region(node, None);
        self.duplicating = false;
        self.annotated(blocks, node, WarningKind::DuplicatedMerge, "duplicated shared tail")
    }

    /// Places one node (and the construct it heads) and returns where the chain continues.
    fn step(&mut self, node: usize, blocks: &mut Vec<ControlFlowBlock>) -> Option<usize> {
        if let Some(region) = self.loops.irreducible[node] {
            return self.irreducible(node, region, blocks);
        }
        if self.loops.is_header(node) {
            return self.generic_loop(node, blocks);
        }
        self.place(node, blocks)
    }

    fn place(&mut self, node: usize, blocks: &mut Vec<ControlFlowBlock>) -> Option<usize> {
        let view = self.view;
        match (&view.nodes[node].kind, view.exits[node]) {
            (NodeKind::Start(_), exits) => {
                self.visit(node);
                exits.primary()
            }
            (NodeKind::Decision { condition }, Exits::Branch { then, otherwise }) => {
                self.if_else(node, condition, then, otherwise, blocks)
            }
            (NodeKind::Action(action), exits) if action.kind == kinds::LOOP_BEGIN => {
                self.idiom_loop(node, exits, blocks)
            }
            (NodeKind::Action(_), Exits::Guarded { success, error }) => {
                self.try_catch(node, success, error, blocks)
            }
            (_, exits) => {
                self.visit(node);
                blocks.push(ControlFlowBlock::statement(view.id(node)));
                exits.primary()
            }
        }
    }

    fn if_else(
        &mut self,
        node: usize,
        condition: &str,
        then: Option<usize>,
        otherwise: Option<usize>,
        blocks: &mut Vec<ControlFlowBlock>,
    ) -> Option<usize> {
        self.visit(node);
        let merge = self.merge_point(node);
        let then_blocks = then.map(|t| self.region(t, merge)).unwrap_or_default();
        let else_blocks = otherwise.map(|e| self.region(e, merge)).unwrap_or_default();

        let else_block = ControlFlowBlock::from_blocks(else_blocks);
        blocks.push(ControlFlowBlock::IfElse {
            node_id: self.view.id(node).to_string(),
            condition: condition.to_string(),
            then_block: Box::new(ControlFlowBlock::from_blocks(then_blocks)),
            else_block: (!else_block.is_empty()).then(|| Box::new(else_block)),
        });
        merge
    }

    fn try_catch(
        &mut self,
        node: usize,
        success: Option<usize>,
        error: usize,
        blocks: &mut Vec<ControlFlowBlock>,
    ) -> Option<usize> {
        self.visit(node);
        let merge = self.merge_point(node);
        let mut try_blocks = vec![ControlFlowBlock::statement(self.view.id(node))];
        if let Some(success) = success {
            try_blocks.extend(self.region(success, merge));
        }
        let catch_blocks = self.region(error, merge);

        blocks.push(ControlFlowBlock::TryCatch {
            node_id: self.view.id(node).to_string(),
            try_block: Box::new(ControlFlowBlock::sequence(try_blocks)),
            catch_block: Box::new(ControlFlowBlock::from_blocks(catch_blocks)),
        });
        merge
    }

    fn idiom_loop(
        &mut self,
        node: usize,
        exits: Exits,
        blocks: &mut Vec<ControlFlowBlock>,
    ) -> Option<usize> {
        let view = self.view;
        let Some(end) = self.match_loop_end(node) else {
            self.warn(
                node,
                WarningKind::UnstructurableRegion,
                "loop-begin has no matching loop-end; emitted as a plain statement".to_string(),
            );
            self.visit(node);
            blocks.push(ControlFlowBlock::statement(view.id(node)));
            return exits.primary();
        };
        let Some(action) = view.nodes[node].action() else {
            return None;
        };

        self.visit(node);
        let body = exits
            .primary()
            .map(|entry| self.region(entry, Some(end)))
            .unwrap_or_default();
        self.visit(end);

        blocks.push(ControlFlowBlock::Loop {
            node_id: view.id(node).to_string(),
            header: LoopHeader::Iterate {
                iterator_expr: action.binding(kinds::LOOP_ITERATOR_KEY).unwrap_or_default().to_string(),
                element_var: action.binding(kinds::LOOP_ELEMENT_KEY).unwrap_or_default().to_string(),
                end_id: view.id(end).to_string(),
            },
            body: Box::new(ControlFlowBlock::from_blocks(body)),
        });
        view.exits[end].primary()
    }

    /// The `loop-end` closing `begin`: first on the post-dominator chain with
    /// balanced nesting, otherwise the first unclaimed one in discovery order.
    fn match_loop_end(&mut self, begin: usize) -> Option<usize> {
        if let Some(found) = self.loop_ends.get(&begin) {
            return *found;
        }

        let view = self.view;
        let mut depth = 0usize;
        let mut chain = self.ipdom[begin];
        let mut found = None;
        while let Some(node) = chain {
            if view.is_action_of(node, kinds::LOOP_END) {
                if depth == 0 {
                    found = (!self.claimed_ends[node]).then_some(node);
                    break;
                }
                depth -= 1;
            } else if view.is_action_of(node, kinds::LOOP_BEGIN) {
                depth += 1;
            }
            chain = self.ipdom[node];
        }

        if found.is_none() {
            found = self.first_reachable_end(begin);
        }
        if let Some(end) = found {
            self.claimed_ends[end] = true;
        }
        self.loop_ends.insert(begin, found);
        found
    }

    fn first_reachable_end(&self, begin: usize) -> Option<usize> {
        let mut seen = vec![false; self.view.len()];
        let mut queue = VecDeque::from([begin]);
        seen[begin] = true;
        while let Some(node) = queue.pop_front() {
            if node != begin
                && self.view.is_action_of(node, kinds::LOOP_END)
                && !self.claimed_ends[node]
            {
                return Some(node);
            }
            for &next in &self.loops.forward[node] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Loops recovered from back edges. A decision header with exactly one
    /// branch inside the loop becomes a conditional loop; anything else loops
    /// unconditionally around the header's own structure.
    fn generic_loop(&mut self, header: usize, blocks: &mut Vec<ControlFlowBlock>) -> Option<usize> {
        let view = self.view;
        tracing::trace!(header = view.id(header), "structuring back-edge loop");
        self.active_loops.push(header);

        if let (NodeKind::Decision { condition }, Exits::Branch { then, otherwise }) =
            (&view.nodes[header].kind, view.exits[header])
        {
            let then_inside = then.is_some_and(|t| self.loops.in_body(header, t));
            let else_inside = otherwise.is_some_and(|e| self.loops.in_body(header, e));
            if then_inside != else_inside {
                let (inside, outside, negated) = if then_inside {
                    (then, otherwise, false)
                } else {
                    (otherwise, then, true)
                };
                self.visit(header);
                let body = inside.map(|i| self.region(i, None)).unwrap_or_default();
                self.active_loops.pop();
                blocks.push(ControlFlowBlock::Loop {
                    node_id: view.id(header).to_string(),
                    header: LoopHeader::While {
                        condition: condition.clone(),
                        negated,
                    },
                    body: Box::new(ControlFlowBlock::from_blocks(body)),
                });
                return outside;
            }
        }

        let mut body = Vec::new();
        if let Some(next) = self.place(header, &mut body) {
            body.extend(self.region(next, None));
        }
        self.active_loops.pop();
        blocks.push(ControlFlowBlock::Loop {
            node_id: view.id(header).to_string(),
            header: LoopHeader::Forever,
            body: Box::new(ControlFlowBlock::from_blocks(body)),
        });
        None
    }

    /// Emits an irreducible region flat, in discovery order, then structures
    /// each of its exits in turn.
    fn irreducible(&mut self, entry: usize, region: usize, blocks: &mut Vec<ControlFlowBlock>) -> Option<usize> {
        let members = self.loops.regions[region].clone();
        self.warn(
            entry,
            WarningKind::UnstructurableRegion,
            format!("irreducible cycle over {} node(s) emitted in discovery order", members.len()),
        );

        let mut statements = Vec::new();
        let mut exits = Vec::new();
        for &member in &members {
            self.visit(member);
            if !matches!(self.view.nodes[member].kind, NodeKind::Start(_)) {
                statements.push(ControlFlowBlock::statement(self.view.id(member)));
            }
            for &next in &self.view.succs[member] {
                if self.loops.irreducible[next] != Some(region) && !exits.contains(&next) {
                    exits.push(next);
                }
            }
        }
        blocks.push(self.annotated(statements, entry, WarningKind::UnstructurableRegion, "irreducible cycle"));

        exits.sort_unstable();
        for exit in exits {
            blocks.extend(self.region(exit, None));
        }
        None
    }

    /// Where the branches of `node` rejoin. A merge outside the innermost
    /// active loop is a loop exit, so each branch runs to its own end instead.
    fn merge_point(&self, node: usize) -> Option<usize> {
        let merge = self.ipdom[node]?;
        match self.active_loops.last() {
            Some(&header) if !self.loops.in_body(header, merge) => None,
            _ => Some(merge),
        }
    }

    fn omitted(&mut self, node: usize) -> ControlFlowBlock {
        self.warn(
            node,
            WarningKind::UnstructurableRegion,
            "duplication budget exhausted; this path is left empty".to_string(),
        );
        self.annotated(Vec::new(), node, WarningKind::UnstructurableRegion, "path omitted")
    }

    fn visit(&mut self, node: usize) {
        if self.emitted[node] > 0 {
            self.warn(
                node,
                WarningKind::DuplicatedMerge,
                "node reached from more than one unrelated path is emitted again".to_string(),
            );
        }
        self.emitted[node] += 1;
        self.budget = self.budget.saturating_sub(1);
    }

    fn annotated(
        &self,
        blocks: Vec<ControlFlowBlock>,
        node: usize,
        kind: WarningKind,
        note: &str,
    ) -> ControlFlowBlock {
        ControlFlowBlock::Sequence {
            blocks,
            annotation: Some(Annotation {
                kind,
                node_id: self.view.id(node).to_string(),
                note: note.to_string(),
            }),
        }
    }

    fn warn(&mut self, node: usize, kind: WarningKind, message: String) {
        self.warnings.push(Warning::new(self.view.id(node), kind, message));
    }
}
