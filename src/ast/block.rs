use super::WarningKind;
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The structured control-flow tree recovered from a pipeline graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlFlowBlock {
    Sequence {
        blocks: Vec<ControlFlowBlock>,
        /// Set on best-effort or duplicated regions so the generator can mark them.
        annotation: Option<Annotation>,
    },
    IfElse {
        node_id: NodeId,
        condition: String,
        then_block: Box<ControlFlowBlock>,
        else_block: Option<Box<ControlFlowBlock>>,
    },
    Loop {
        node_id: NodeId,
        header: LoopHeader,
        body: Box<ControlFlowBlock>,
    },
    TryCatch {
        node_id: NodeId,
        try_block: Box<ControlFlowBlock>,
        catch_block: Box<ControlFlowBlock>,
    },
    Statement {
        node_id: NodeId,
    },
}

/// How a loop iterates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopHeader {
    /// A `loop-begin` / `loop-end` pair.
    Iterate {
        iterator_expr: String,
        element_var: String,
        end_id: NodeId,
    },
    /// A back-edge loop headed by a decision; the body runs while the condition holds.
    While { condition: String, negated: bool },
    /// A back-edge loop with no usable condition. The header node is the first
    /// thing in the body.
    Forever,
}

/// A note attached to a sequence that was not cleanly structured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: WarningKind,
    pub node_id: NodeId,
    pub note: String,
}

impl ControlFlowBlock {
    pub fn statement(node_id: impl Into<NodeId>) -> Self {
        ControlFlowBlock::Statement {
            node_id: node_id.into(),
        }
    }

    pub fn sequence(blocks: Vec<ControlFlowBlock>) -> Self {
        ControlFlowBlock::Sequence {
            blocks,
            annotation: None,
        }
    }

    /// Wraps `blocks` in a sequence, unwrapping a single child.
    pub fn from_blocks(mut blocks: Vec<ControlFlowBlock>) -> Self {
        if blocks.len() == 1 {
            if let Some(block) = blocks.pop() {
                return block;
            }
        }
        Self::sequence(blocks)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ControlFlowBlock::Sequence { blocks, annotation: None } if blocks.iter().all(|b| b.is_empty()))
    }

    /// Ids of every `Statement` leaf, in tree order.
    pub fn statement_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_statements(&mut ids);
        ids
    }

    fn collect_statements<'a>(&'a self, ids: &mut Vec<&'a str>) {
        match self {
            ControlFlowBlock::Sequence { blocks, .. } => {
                for block in blocks {
                    block.collect_statements(ids);
                }
            }
            ControlFlowBlock::IfElse {
                then_block,
                else_block,
                ..
            } => {
                then_block.collect_statements(ids);
                if let Some(else_block) = else_block {
                    else_block.collect_statements(ids);
                }
            }
            ControlFlowBlock::Loop { body, .. } => body.collect_statements(ids),
            ControlFlowBlock::TryCatch {
                try_block,
                catch_block,
                ..
            } => {
                try_block.collect_statements(ids);
                catch_block.collect_statements(ids);
            }
            ControlFlowBlock::Statement { node_id } => ids.push(node_id),
        }
    }

    /// Ids of every node the tree accounts for: statements plus the nodes that
    /// became `IfElse`, `Loop` and `TryCatch` headers.
    pub fn covered_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_covered(&mut ids);
        ids
    }

    fn collect_covered<'a>(&'a self, ids: &mut Vec<&'a str>) {
        match self {
            ControlFlowBlock::Sequence { blocks, .. } => {
                for block in blocks {
                    block.collect_covered(ids);
                }
            }
            ControlFlowBlock::IfElse {
                node_id,
                then_block,
                else_block,
                ..
            } => {
                ids.push(node_id);
                then_block.collect_covered(ids);
                if let Some(else_block) = else_block {
                    else_block.collect_covered(ids);
                }
            }
            ControlFlowBlock::Loop {
                node_id,
                header,
                body,
            } => {
                match header {
                    LoopHeader::Iterate { end_id, .. } => {
                        ids.push(node_id);
                        ids.push(end_id);
                    }
                    LoopHeader::While { .. } => ids.push(node_id),
                    LoopHeader::Forever => {}
                }
                body.collect_covered(ids);
            }
            // The try block already starts with the guarded node's own statement.
            ControlFlowBlock::TryCatch {
                try_block,
                catch_block,
                ..
            } => {
                try_block.collect_covered(ids);
                catch_block.collect_covered(ids);
            }
            ControlFlowBlock::Statement { node_id } => ids.push(node_id),
        }
    }
}

/// Renders a block tree for debugging, one node per line.
pub struct DisplayBlock<'a> {
    pub block: &'a ControlFlowBlock,
}

impl fmt::Display for DisplayBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_as_tree(self.block, f, "", true)
    }
}

fn fmt_as_tree(
    block: &ControlFlowBlock,
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
    is_last: bool,
) -> fmt::Result {
    let node_marker = if is_last { "└── " } else { "├── " };
    write!(f, "{}{}", prefix, node_marker)?;
    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

    match block {
        ControlFlowBlock::Sequence { blocks, annotation } => {
            match annotation {
                Some(a) => writeln!(f, "Sequence [{}: {}]", a.kind, a.note)?,
                None => writeln!(f, "Sequence")?,
            }
            fmt_children(blocks.iter(), f, &child_prefix)?;
        }
        ControlFlowBlock::IfElse {
            node_id,
            condition,
            then_block,
            else_block,
        } => {
            writeln!(f, "If ({}) [{}]", condition, node_id)?;
            fmt_as_tree(then_block, f, &child_prefix, else_block.is_none())?;
            if let Some(else_block) = else_block {
                fmt_as_tree(else_block, f, &child_prefix, true)?;
            }
        }
        ControlFlowBlock::Loop {
            node_id,
            header,
            body,
        } => {
            match header {
                LoopHeader::Iterate {
                    iterator_expr,
                    element_var,
                    end_id,
                } => writeln!(
                    f,
                    "Loop {} in {} [{}..{}]",
                    element_var, iterator_expr, node_id, end_id
                )?,
                LoopHeader::While { condition, negated } => writeln!(
                    f,
                    "While {}({}) [{}]",
                    if *negated { "!" } else { "" },
                    condition,
                    node_id
                )?,
                LoopHeader::Forever => writeln!(f, "Loop [{}]", node_id)?,
            }
            fmt_as_tree(body, f, &child_prefix, true)?;
        }
        ControlFlowBlock::TryCatch {
            node_id,
            try_block,
            catch_block,
        } => {
            writeln!(f, "Try [{}]", node_id)?;
            fmt_as_tree(try_block, f, &child_prefix, false)?;
            fmt_as_tree(catch_block, f, &child_prefix, true)?;
        }
        ControlFlowBlock::Statement { node_id } => writeln!(f, "Statement [{}]", node_id)?,
    }
    Ok(())
}

fn fmt_children<'a>(
    blocks: impl ExactSizeIterator<Item = &'a ControlFlowBlock>,
    f: &mut fmt::Formatter<'_>,
    prefix: &str,
) -> fmt::Result {
    let count = blocks.len();
    for (i, block) in blocks.enumerate() {
        fmt_as_tree(block, f, prefix, i + 1 == count)?;
    }
    Ok(())
}
