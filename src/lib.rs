//! # Pipeflow - Pipeline to Controller Conversion Engine
//!
//! **Pipeflow** turns legacy flowchart pipelines (start, decision, pipelet,
//! interaction and end nodes wired together by labeled transitions) into
//! structured JavaScript controllers. The hard part is recovering nested
//! `if`/`else`, loops and `try`/`catch` from an arbitrary graph with merges,
//! shared tails, error edges and back edges; the rest is a table of per-kind
//! emitters.
//!
//! ## Core Workflow
//!
//! 1.  **Parse**: [`parse`] reads an XML or JSON pipeline document into an immutable [`graph::Graph`].
//!     Custom layouts implement [`definition::IntoDefinition`] instead.
//! 2.  **Analyze**: [`analyze`] structures every start node into an [`ast::AnalyzedFunction`]
//!     and collects recoverable problems as [`ast::Warning`]s.
//! 3.  **Generate**: [`generate`] walks the structured trees, asks the [`emitter::EmitterRegistry`]
//!     for each statement and writes one controller module.
//!
//! [`converter::Converter`] runs all three steps and is the usual entry point.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipeflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let source = std::fs::read_to_string("pipelines/Product.xml")?;
//!
//!     // Map an in-house pipelet onto a built-in emitter, and mark warnings in the output.
//!     let converter = Converter::builder()
//!         .with_kind_mapping("FetchProduct", "retrieve-product")
//!         .strict(true)
//!         .build();
//!
//!     let conversion = converter.convert(&source, "Product")?;
//!     for warning in conversion.warnings() {
//!         eprintln!("{}", warning);
//!     }
//!     println!("{}", conversion.code());
//!     Ok(())
//! }
//! ```
//!
//! The three stages can also be driven separately:
//!
//! ```rust,no_run
//! # fn run(source: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let graph = pipeflow::parse(source, "Product")?;
//! let analysis = pipeflow::analyze(&graph);
//! let output = pipeflow::generate(&graph, &analysis, &Default::default())?;
//! print!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod ast;
pub mod converter;
pub mod definition;
pub mod emitter;
pub mod error;
pub mod generator;
pub mod graph;
pub mod parser;
pub mod prelude;

pub use analyzer::analyze;
pub use generator::generate;
pub use parser::parse;
