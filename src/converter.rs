use crate::analyzer::{Analyzer, AnalyzerOptions, DEFAULT_ERROR_TEMPLATE};
use crate::ast::{AnalysisResult, Warning};
use crate::emitter::{EmitterRegistry, ExpressionTransformer, NodeEmitter};
use crate::error::ConversionError;
use crate::generator::{GenerateOptions, GeneratedSource, Generator};
use crate::graph::Graph;
use crate::parser;
use rayon::prelude::*;

/// Everything produced for one document.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub name: String,
    pub graph: Graph,
    pub analysis: AnalysisResult,
    pub output: GeneratedSource,
}

impl Conversion {
    pub fn code(&self) -> &str {
        &self.output.code
    }

    /// Analysis and generation warnings, deduplicated.
    pub fn warnings(&self) -> &[Warning] {
        &self.output.warnings
    }
}

/// Parse, analyze and generate in one call, with a configurable emitter table.
#[derive(Debug)]
pub struct Converter {
    analyzer: Analyzer,
    generator: Generator,
    options: GenerateOptions,
}

pub struct ConverterBuilder {
    registry: EmitterRegistry,
    transformer: ExpressionTransformer,
    error_templates: Vec<String>,
    options: GenerateOptions,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    pub fn new() -> Self {
        Self {
            registry: EmitterRegistry::with_defaults(),
            transformer: ExpressionTransformer::new(),
            error_templates: vec![DEFAULT_ERROR_TEMPLATE.to_string()],
            options: GenerateOptions::default(),
        }
    }

    /// Emits actions of `user_kind` with the built-in emitter for `builtin_kind`.
    /// Unknown built-in kinds are ignored.
    pub fn with_kind_mapping(mut self, user_kind: &str, builtin_kind: &str) -> Self {
        if !self.registry.alias(user_kind, builtin_kind) {
            tracing::debug!(user_kind, builtin_kind, "ignoring mapping to unknown built-in kind");
        }
        self
    }

    pub fn with_emitter(mut self, emitter: Box<dyn NodeEmitter>) -> Self {
        self.registry.register(emitter);
        self
    }

    /// Adds a template that counts as an error page. The default
    /// `error/notfound` stays registered.
    pub fn with_error_template(mut self, template: &str) -> Self {
        if !self.error_templates.iter().any(|t| t == template) {
            self.error_templates.push(template.to_string());
        }
        self
    }

    /// Maps one more legacy dictionary name in generated expressions.
    pub fn with_global(mut self, legacy: &str, replacement: &str) -> Self {
        self.transformer = self.transformer.with_global(legacy, replacement);
        self
    }

    pub fn with_indent(mut self, indent: &str) -> Self {
        self.options.indent = indent.to_string();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn build(self) -> Converter {
        Converter {
            analyzer: Analyzer::new(AnalyzerOptions {
                error_templates: self.error_templates,
            }),
            generator: Generator::new(self.registry).with_transformer(self.transformer),
            options: self.options,
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        ConverterBuilder::new().build()
    }
}

impl Converter {
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Runs the full pipeline on one XML or JSON document.
    pub fn convert(&self, source: &str, name: &str) -> Result<Conversion, ConversionError> {
        let graph = parser::parse(source, name).map_err(|source| ConversionError::Parse {
            definition: name.to_string(),
            source,
        })?;
        self.convert_graph(graph, name)
    }

    /// Analyzes and generates an already parsed graph.
    pub fn convert_graph(&self, graph: Graph, name: &str) -> Result<Conversion, ConversionError> {
        let analysis = self.analyzer.analyze(&graph);
        let output = self
            .generator
            .generate(&graph, &analysis, &self.options)
            .map_err(|source| ConversionError::Generate {
                definition: name.to_string(),
                source,
            })?;
        tracing::debug!(
            definition = name,
            functions = analysis.functions.len(),
            warnings = output.warnings.len(),
            "converted pipeline"
        );
        Ok(Conversion {
            name: name.to_string(),
            graph,
            analysis,
            output,
        })
    }

    /// Converts independent `(name, source)` documents in parallel. Results
    /// keep the input order.
    pub fn convert_batch<N, S>(&self, documents: &[(N, S)]) -> Vec<Result<Conversion, ConversionError>>
    where
        N: AsRef<str> + Sync,
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|(name, source)| self.convert(source.as_ref(), name.as_ref()))
            .collect()
    }
}
