use thiserror::Error;

/// Fatal errors raised while reading a pipeline document into a `Graph`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to parse pipeline XML: {0}")]
    XmlParseError(String),

    #[error("Failed to parse pipeline JSON: {0}")]
    JsonParseError(String),

    #[error("Unrecognized document format: expected an XML or JSON pipeline definition")]
    UnknownFormat,

    #[error("A node in definition '{definition}' has no identifier")]
    MissingNodeId { definition: String },

    #[error("Node '{node_id}' is declared more than once")]
    DuplicateNode { node_id: String },

    #[error("Node '{node_id}' has an unknown node type: '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Node '{node_id}' is missing the required attribute '{attribute}'")]
    MissingAttribute { node_id: String, attribute: String },

    #[error("Node '{node_id}' has a transition to '{target_id}', which does not exist")]
    DanglingTransition { node_id: String, target_id: String },
}

/// Errors raised by lookups on an immutable `Graph`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node '{0}' not found in the pipeline graph")]
    NodeNotFound(String),
}

/// Errors raised while serializing an analysis into source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Function '{function}' references node '{node_id}', which is not a {expected} node")]
    UnexpectedNode {
        function: String,
        node_id: String,
        expected: &'static str,
    },
}

/// Errors that can occur when converting a custom user format into a `PipelineDefinition`.
#[derive(Error, Debug, Clone)]
pub enum DefinitionError {
    #[error("Invalid custom definition: {0}")]
    ValidationError(String),
}

/// Any error produced by a full parse, analyze and generate run.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("{definition}: {source}")]
    Parse {
        definition: String,
        #[source]
        source: ParseError,
    },

    #[error("{definition}: {source}")]
    Generate {
        definition: String,
        #[source]
        source: GenerateError,
    },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
