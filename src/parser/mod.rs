//! Reads pipeline documents into an immutable [`Graph`].
//!
//! Two document layouts are understood out of the box and detected from the
//! first non-whitespace character: XML (`<pipeline>` with `<node>` children)
//! and JSON (a serialized [`PipelineDefinition`]). Other layouts go through
//! [`IntoDefinition`] and [`parse_definition`].

use crate::definition::{IntoDefinition, PipelineDefinition};
use crate::error::{ConversionError, ParseError};
use crate::graph::Graph;

mod decode;
mod xml;

pub use decode::decode;

/// Parses `source` (XML or JSON) into a graph named `definition_name`.
pub fn parse(source: &str, definition_name: &str) -> Result<Graph, ParseError> {
    let definition = read_definition(source)?;
    let graph = decode(definition, definition_name)?;
    tracing::debug!(
        definition = definition_name,
        nodes = graph.len(),
        "parsed pipeline definition"
    );
    Ok(graph)
}

/// Decodes a definition produced by a custom reader.
pub fn parse_definition(
    document: impl IntoDefinition,
    definition_name: &str,
) -> Result<Graph, ConversionError> {
    let definition = document.into_definition()?;
    decode(definition, definition_name).map_err(|source| ConversionError::Parse {
        definition: definition_name.to_string(),
        source,
    })
}

/// Reads the raw document into a definition without decoding node kinds.
pub fn read_definition(source: &str) -> Result<PipelineDefinition, ParseError> {
    match source.trim_start().chars().next() {
        Some('<') => xml::read(source),
        Some('{') => serde_json::from_str(source)
            .map_err(|e| ParseError::JsonParseError(e.to_string())),
        _ => Err(ParseError::UnknownFormat),
    }
}
