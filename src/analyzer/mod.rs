//! Control-flow structuring: turns each entry point of a `Graph` into a tree
//! of sequences, conditionals, loops and protected blocks.

mod dominators;
mod lint;
mod loops;
mod structurer;
mod view;

use crate::ast::{AnalysisResult, AnalyzedFunction, ModuleRef, Warning};
use crate::emitter::modules;
use crate::graph::{Graph, Node, NodeKind, kinds};
use ahash::AHashSet;
use itertools::Itertools;
use std::collections::BTreeSet;
use structurer::Structurer;
use view::FlowView;

/// The template most pipelines render when a lookup fails.
pub const DEFAULT_ERROR_TEMPLATE: &str = "error/notfound";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Templates that count as error pages for the dead-end lint.
    pub error_templates: Vec<String>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            error_templates: vec![DEFAULT_ERROR_TEMPLATE.to_string()],
        }
    }
}

/// Structures every start node of a graph. Cheap to construct and reusable.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Produces one function per start node, in declaration order, plus every
    /// warning found along the way. Never fails: anything that cannot be
    /// structured cleanly is emitted best-effort and reported.
    pub fn analyze(&self, graph: &Graph) -> AnalysisResult {
        let mut functions = Vec::new();
        let mut warnings = Vec::new();
        let mut reached: AHashSet<&str> = AHashSet::new();

        for start in graph.start_nodes() {
            let Some(info) = start.start() else {
                continue;
            };
            let view = FlowView::build(graph, start);
            reached.extend(view.nodes.iter().map(|n| n.id.as_str()));
            warnings.extend(view.warnings.iter().cloned());

            let (body, structure_warnings) = Structurer::new(&view).run();
            warnings.extend(structure_warnings);

            tracing::debug!(
                function = %info.name,
                nodes = view.len(),
                "structured entry point"
            );

            functions.push(AnalyzedFunction {
                name: info.name.clone(),
                start_id: start.id.clone(),
                is_public: info.is_public,
                is_form_handler: info.is_form_handler,
                body,
                required_imports: required_imports(&view.nodes),
            });
        }

        warnings.extend(lint::lint_graph(graph, &reached, &self.options.error_templates));
        let warnings = dedup(warnings);
        for warning in &warnings {
            tracing::warn!(node = %warning.node_id, kind = %warning.kind, "{}", warning.message);
        }

        AnalysisResult { functions, warnings }
    }
}

/// Structures `graph` with the default options.
pub fn analyze(graph: &Graph) -> AnalysisResult {
    Analyzer::default().analyze(graph)
}

/// Modules a function needs that can be read off its nodes without emitting them.
fn required_imports(nodes: &[&Node]) -> BTreeSet<ModuleRef> {
    let mut imports = BTreeSet::new();
    for node in nodes {
        match &node.kind {
            NodeKind::Interaction { .. } => {
                imports.insert(modules::isml());
            }
            NodeKind::Action(action) if action.kind == kinds::RUN_SCRIPT => {
                if let Some(script) = action.config(modules::SCRIPT_KEY) {
                    imports.insert(modules::script_module(script));
                }
            }
            NodeKind::Action(action) if action.kind == kinds::CALL_PIPELINE => {
                if let Some(target) = action.config(modules::PIPELINE_KEY) {
                    imports.insert(modules::controller_module(target).0);
                }
            }
            _ => {}
        }
    }
    imports
}

/// Drops repeated warnings, keeping the first occurrence.
fn dedup(warnings: Vec<Warning>) -> Vec<Warning> {
    warnings.into_iter().unique().collect()
}
