use super::document::PipelineDefinition;
use crate::error::DefinitionError;

/// A trait for custom document models that can be converted into a `PipelineDefinition`.
///
/// The XML and JSON readers cover the common layouts. Any other layout (a
/// database export, a YAML dialect, an editor's internal model) implements this
/// trait and is then handed to [`crate::parser::parse_definition`].
///
/// # Example
///
/// ```rust,no_run
/// use pipeflow::definition::*;
/// use pipeflow::error::DefinitionError;
///
/// struct Step { id: String, next: Option<String> }
/// struct Flow { steps: Vec<Step> }
///
/// impl IntoDefinition for Flow {
///     fn into_definition(self) -> Result<PipelineDefinition, DefinitionError> {
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|step| NodeDefinition {
///                 id: step.id,
///                 node_type: "end".to_string(),
///                 transitions: step
///                     .next
///                     .into_iter()
///                     .map(|target| TransitionDefinition { target, label: None })
///                     .collect(),
///                 ..Default::default()
///             })
///             .collect();
///         Ok(PipelineDefinition { name: None, nodes })
///     }
/// }
/// ```
pub trait IntoDefinition {
    /// Consumes the object and converts it into a pipeline definition.
    fn into_definition(self) -> Result<PipelineDefinition, DefinitionError>;
}

impl IntoDefinition for PipelineDefinition {
    fn into_definition(self) -> Result<PipelineDefinition, DefinitionError> {
        Ok(self)
    }
}
