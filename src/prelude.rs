//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the pipeflow crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use pipeflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let source = std::fs::read_to_string("path/to/Cart.xml")?;
//! let conversion = Converter::default().convert(&source, "Cart")?;
//!
//! println!("{}", DisplayBlock { block: &conversion.analysis.functions[0].body });
//! println!("{}", conversion.code());
//! # Ok(())
//! # }
//! ```

// Pipeline stages
pub use crate::analyzer::{Analyzer, AnalyzerOptions, analyze};
pub use crate::converter::{Conversion, Converter, ConverterBuilder};
pub use crate::generator::{GenerateOptions, GeneratedSource, Generator, generate};
pub use crate::parser::{parse, parse_definition};

// Graph and structured tree
pub use crate::ast::{
    AnalysisResult, AnalyzedFunction, ControlFlowBlock, DisplayBlock, LoopHeader, ModuleRef, Warning,
    WarningKind,
};
pub use crate::graph::{Graph, Node, NodeKind, Transition};

// Extension points
pub use crate::definition::{IntoDefinition, PipelineDefinition};
pub use crate::emitter::{
    EmittedCode, EmitterContext, EmitterRegistry, ExpressionTransformer, ImportTable, NodeEmitter,
};

// Error types
pub use crate::error::{ConversionError, GenerateError, ParseError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
