//! Serializes an `AnalysisResult` into a controller module.

mod writer;

use crate::ast::{
    AnalysisResult, AnalyzedFunction, Annotation, ControlFlowBlock, LoopHeader, Warning, WarningKind,
    identifier,
};
use crate::emitter::{EmitterContext, EmitterRegistry, ExpressionTransformer, ImportTable};
use crate::error::GenerateError;
use crate::graph::{Graph, Node, NodeKind};
use ahash::AHashSet;
use std::fmt;
use writer::CodeWriter;

const LOOP_INDEX_NAMES: [&str; 4] = ["i", "j", "k", "l"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Precede best-effort regions and placeholders with `// WARNING:` comments.
    pub strict: bool,
    /// One level of indentation.
    pub indent: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            strict: false,
            indent: "    ".to_string(),
        }
    }
}

/// Generated controller source plus every warning raised for it, analysis first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    pub code: String,
    pub warnings: Vec<Warning>,
}

impl fmt::Display for GeneratedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Generates with the built-in emitters.
pub fn generate(
    graph: &Graph,
    analysis: &AnalysisResult,
    options: &GenerateOptions,
) -> Result<GeneratedSource, GenerateError> {
    Generator::default().generate(graph, analysis, options)
}

#[derive(Debug, Default)]
pub struct Generator {
    registry: EmitterRegistry,
    transformer: ExpressionTransformer,
}

impl Generator {
    pub fn new(registry: EmitterRegistry) -> Self {
        Self {
            registry,
            transformer: ExpressionTransformer::new(),
        }
    }

    pub fn with_transformer(mut self, transformer: ExpressionTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn registry(&self) -> &EmitterRegistry {
        &self.registry
    }

    pub fn generate(
        &self,
        graph: &Graph,
        analysis: &AnalysisResult,
        options: &GenerateOptions,
    ) -> Result<GeneratedSource, GenerateError> {
        for function in &analysis.functions {
            let start = graph.node(&function.start_id)?;
            if !matches!(start.kind, NodeKind::Start(_)) {
                return Err(GenerateError::UnexpectedNode {
                    function: function.name.clone(),
                    node_id: function.start_id.clone(),
                    expected: "start",
                });
            }
        }

        let imports = self.import_table(graph, analysis)?;
        let mut warnings = analysis.warnings.clone();
        let mut bodies = CodeWriter::new(&options.indent);

        for function in &analysis.functions {
            let mut emitter = FunctionEmitter {
                graph,
                generator: self,
                options,
                writer: CodeWriter::new(&options.indent),
                declared: AHashSet::new(),
                imports: &imports,
                warnings: &mut warnings,
                loop_depth: 0,
            };
            emitter.function(function)?;
            bodies.blank();
            bodies.append(emitter.writer);
            tracing::debug!(function = %function.name, "generated function");
        }

        let mut out = CodeWriter::new(&options.indent);
        out.line(0, "'use strict';");
        if !imports.is_empty() {
            out.blank();
            for module in imports.modules() {
                out.line(0, &format!("var {} = require('{}');", module.alias, module.path));
            }
        }
        out.append(bodies);
        if !analysis.functions.is_empty() {
            out.blank();
        }
        for function in &analysis.functions {
            let name = identifier(&function.name);
            out.line(0, &format!("exports.{} = {};", name, name));
            if function.is_public {
                out.line(0, &format!("exports.{}.public = true;", name));
            }
        }

        let mut seen = AHashSet::new();
        warnings.retain(|w| seen.insert(w.clone()));
        Ok(GeneratedSource {
            code: out.finish(),
            warnings,
        })
    }

    /// Names every module the file requires before any body is written, so
    /// each call site already knows the final name of its module. Analyzed
    /// imports claim names first, then whatever the emitters add, in function
    /// and statement order. Emitters are pure, so a dry run finds their imports.
    fn import_table(&self, graph: &Graph, analysis: &AnalysisResult) -> Result<ImportTable, GenerateError> {
        let mut table = ImportTable::new();
        for function in &analysis.functions {
            for module in &function.required_imports {
                table.insert(module);
            }
        }

        let declared = AHashSet::new();
        let unnamed = ImportTable::new();
        let ctx = EmitterContext {
            depth: 0,
            declared: &declared,
            transformer: &self.transformer,
            modules: &unnamed,
        };
        for function in &analysis.functions {
            for node_id in function.body.statement_ids() {
                let code = self.registry.emit(graph.node(node_id)?, &ctx);
                for module in &code.imports {
                    table.insert(module);
                }
            }
        }
        Ok(table)
    }
}

/// Per-function generation state.
struct FunctionEmitter<'a, 'w> {
    graph: &'a Graph,
    generator: &'a Generator,
    options: &'a GenerateOptions,
    writer: CodeWriter<'a>,
    declared: AHashSet<String>,
    imports: &'a ImportTable,
    warnings: &'w mut Vec<Warning>,
    loop_depth: usize,
}

impl FunctionEmitter<'_, '_> {
    fn function(&mut self, function: &AnalyzedFunction) -> Result<(), GenerateError> {
        let name = identifier(&function.name);
        if function.is_form_handler {
            self.writer.line(0, "/** Handles a form submission. */");
        }
        self.writer.line(0, &format!("function {}(pdict) {{", name));
        self.writer.line(1, "pdict = pdict || {};");
        self.block(&function.body, 1)?;
        self.writer.line(0, "}");
        Ok(())
    }

    fn block(&mut self, block: &ControlFlowBlock, depth: usize) -> Result<(), GenerateError> {
        match block {
            ControlFlowBlock::Sequence { blocks, annotation } => {
                if let Some(annotation) = annotation {
                    self.annotate(annotation, depth);
                }
                for child in blocks {
                    self.block(child, depth)?;
                }
            }
            ControlFlowBlock::IfElse {
                condition,
                then_block,
                else_block,
                ..
            } => {
                let condition = self.expr(condition);
                self.writer.line(depth, &format!("if ({}) {{", condition));
                self.block(then_block, depth + 1)?;
                match else_block {
                    Some(else_block) if !else_block.is_empty() => {
                        self.writer.line(depth, "} else {");
                        self.block(else_block, depth + 1)?;
                        self.writer.line(depth, "}");
                    }
                    _ => self.writer.line(depth, "}"),
                }
            }
            ControlFlowBlock::Loop { header, body, .. } => self.loop_block(header, body, depth)?,
            ControlFlowBlock::TryCatch {
                try_block,
                catch_block,
                ..
            } => {
                self.writer.line(depth, "try {");
                self.block(try_block, depth + 1)?;
                self.writer.line(depth, "} catch (e) {");
                self.block(catch_block, depth + 1)?;
                self.writer.line(depth, "}");
            }
            ControlFlowBlock::Statement { node_id } => self.statement(node_id, depth)?,
        }
        Ok(())
    }

    fn loop_block(
        &mut self,
        header: &LoopHeader,
        body: &ControlFlowBlock,
        depth: usize,
    ) -> Result<(), GenerateError> {
        match header {
            LoopHeader::Iterate {
                iterator_expr,
                element_var,
                ..
            } => {
                let index = LOOP_INDEX_NAMES
                    .get(self.loop_depth)
                    .map_or_else(|| format!("i{}", self.loop_depth), |n| n.to_string());
                let items = self.expr(iterator_expr);
                self.writer.line(
                    depth,
                    &format!(
                        "for (var {i} = 0; {i} < {items}.length; {i}++) {{",
                        i = index,
                        items = items
                    ),
                );
                let element = identifier(element_var);
                let declare = if self.declared.insert(element.clone()) { "var " } else { "" };
                self.writer
                    .line(depth + 1, &format!("{}{} = {}[{}];", declare, element, items, index));
            }
            LoopHeader::While { condition, negated } => {
                let condition = self.expr(condition);
                let test = if *negated {
                    format!("!({})", condition)
                } else {
                    condition
                };
                self.writer.line(depth, &format!("while ({}) {{", test));
            }
            LoopHeader::Forever => self.writer.line(depth, "while (true) {"),
        }
        self.loop_depth += 1;
        self.block(body, depth + 1)?;
        self.loop_depth -= 1;
        self.writer.line(depth, "}");
        Ok(())
    }

    fn statement(&mut self, node_id: &str, depth: usize) -> Result<(), GenerateError> {
        let node = self.graph.node(node_id)?;
        let code = {
            let ctx = EmitterContext {
                depth,
                declared: &self.declared,
                transformer: &self.generator.transformer,
                modules: self.imports,
            };
            self.generator.registry.emit(node, &ctx)
        };

        if let Some(message) = &code.warning {
            tracing::warn!(node = node_id, kind = %WarningKind::UnknownActionKind, "{}", message);
            if self.options.strict {
                self.writer.line(depth, &format!("// WARNING: {}: {}", WarningKind::UnknownActionKind, message));
            }
            self.warnings.push(Warning::new(
                node_id,
                WarningKind::UnknownActionKind,
                message.clone(),
            ));
        }
        for line in &code.lines {
            self.writer.line(depth, line);
        }
        // Inside a loop, falling off the end of a path would start the next
        // iteration instead of stopping.
        if self.loop_depth > 0 && self.ends_path(node) {
            self.writer.line(depth, "return;");
        }
        self.declared.extend(code.declares);
        Ok(())
    }

    /// Whether the flow stops after `node`. End nodes are left out since
    /// their emitter already returns.
    fn ends_path(&self, node: &Node) -> bool {
        match &node.kind {
            NodeKind::Interaction { .. } => true,
            NodeKind::Action(_) => !node
                .transitions
                .iter()
                .any(|t| !t.is_error() && !self.graph.is_loop_back(node, t)),
            NodeKind::Start(_) | NodeKind::Decision { .. } | NodeKind::End { .. } => false,
        }
    }

    fn annotate(&mut self, annotation: &Annotation, depth: usize) {
        if self.options.strict {
            self.writer.line(
                depth,
                &format!(
                    "// WARNING: {}: {} (node {})",
                    annotation.kind, annotation.note, annotation.node_id
                ),
            );
        }
    }

    fn expr(&self, expr: &str) -> String {
        self.generator.transformer.transform(expr.trim(), &self.declared)
    }
}
