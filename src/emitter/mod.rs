//! Per-kind code emission. Every node kind maps to a `NodeEmitter`; the
//! generator looks emitters up by kind and never special-cases node types.

mod builtin;
pub mod expression;
pub mod modules;

use crate::ast::ModuleRef;
use crate::graph::{Node, NodeKind, kinds};
use ahash::{AHashMap, AHashSet};

pub use expression::ExpressionTransformer;
pub use modules::ImportTable;

/// Turns one node into source lines.
///
/// Implementations must be pure: the same node and context always produce the
/// same output.
pub trait NodeEmitter: Send + Sync {
    /// The node kind this emitter handles, e.g. `retrieve-product` or `node:end`.
    fn kind(&self) -> &str;
    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode;
}

/// What an emitter produced for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedCode {
    /// Source lines without leading indentation.
    pub lines: Vec<String>,
    /// Modules the lines call into. Refer to them by `EmitterContext::module`
    /// so a renamed module is called by its final name.
    pub imports: Vec<ModuleRef>,
    /// Local names this code declares with `var`.
    pub declares: Vec<String>,
    pub warning: Option<String>,
}

impl EmittedCode {
    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            ..Self::default()
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn import(mut self, module: ModuleRef) -> Self {
        self.imports.push(module);
        self
    }
}

/// Read-only state an emitter sees while generating one node.
pub struct EmitterContext<'a> {
    /// Nesting depth of the statement inside its function body.
    pub depth: usize,
    /// Names already declared with `var` in the current function.
    pub declared: &'a AHashSet<String>,
    pub transformer: &'a ExpressionTransformer,
    /// Every module the output file requires, with its final name.
    pub modules: &'a ImportTable,
}

/// A local temporary and whether this assignment declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    pub lhs: String,
    pub declares: Option<String>,
}

impl EmitterContext<'_> {
    /// Rewrites a pipeline expression for use in the controller.
    pub fn expr(&self, expr: &str) -> String {
        self.transformer.transform(expr.trim(), self.declared)
    }

    /// The variable name the file binds `module` to.
    pub fn module(&self, module: &ModuleRef) -> String {
        self.modules.alias(module).to_string()
    }

    /// Where a pipelet output lands. Outputs stay in the pipeline dictionary
    /// unless the name is a declared local such as a loop element.
    pub fn assign_target(&self, name: &str) -> String {
        self.expr(name)
    }

    /// A function-local temporary, declared with `var` on first use.
    pub fn local(&self, name: &str) -> LocalTarget {
        if self.declared.contains(name) {
            LocalTarget {
                lhs: name.to_string(),
                declares: None,
            }
        } else {
            LocalTarget {
                lhs: format!("var {}", name),
                declares: Some(name.to_string()),
            }
        }
    }
}

/// The key an emitter is registered under for `node`.
pub fn emitter_kind(node: &Node) -> &str {
    match &node.kind {
        NodeKind::Start(_) => kinds::START_NODE,
        NodeKind::Action(action) => action.kind.as_str(),
        NodeKind::Decision { .. } => kinds::DECISION_NODE,
        NodeKind::Interaction { .. } => kinds::INTERACTION_NODE,
        NodeKind::End { .. } => kinds::END_NODE,
    }
}

/// Emitters by kind.
pub struct EmitterRegistry {
    emitters: AHashMap<String, Box<dyn NodeEmitter>>,
}

impl Default for EmitterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for EmitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.emitters.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("EmitterRegistry").field("kinds", &kinds).finish()
    }
}

impl EmitterRegistry {
    /// A registry with no emitters; every node falls back to the placeholder.
    pub fn empty() -> Self {
        Self {
            emitters: AHashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut emitters: AHashMap<String, Box<dyn NodeEmitter>> = AHashMap::new();
        builtin::register_builtin_emitters(&mut emitters);
        Self { emitters }
    }

    /// Adds `emitter` under its own kind, replacing any previous one.
    pub fn register(&mut self, emitter: Box<dyn NodeEmitter>) {
        self.emitters.insert(emitter.kind().to_string(), emitter);
    }

    /// Handles `user_kind` with the built-in emitter for `builtin_kind`.
    /// Returns `false` if no such built-in exists.
    pub fn alias(&mut self, user_kind: &str, builtin_kind: &str) -> bool {
        match builtin::create_emitter_by_kind(builtin_kind) {
            Some(emitter) => {
                self.emitters.insert(user_kind.to_string(), emitter);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, kind: &str) -> Option<&dyn NodeEmitter> {
        self.emitters.get(kind).map(|e| e.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.emitters.contains_key(kind)
    }

    /// Emits `node` with its registered emitter, or with a placeholder comment
    /// and a warning when its kind is unknown.
    pub fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let kind = emitter_kind(node);
        match self.get(kind) {
            Some(emitter) => emitter.emit(node, ctx),
            None => {
                tracing::debug!(node = %node.id, kind, "no emitter registered");
                EmittedCode {
                    lines: vec![format!("/* UNSUPPORTED pipelet '{}' ({}) */", kind, node.id)],
                    warning: Some(format!("no emitter registered for kind '{}'", kind)),
                    ..EmittedCode::default()
                }
            }
        }
    }
}
