use serde::{Deserialize, Serialize};

/// The canonical, format-agnostic description of a pipeline document.
/// Every reader (XML, JSON, custom) produces this before decoding into a `Graph`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub nodes: Vec<NodeDefinition>,
}

/// A single declared node, with its attributes still as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", alias = "nodeType")]
    pub node_type: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default, alias = "keyBindings")]
    pub key_bindings: Vec<BindingDefinition>,
    #[serde(default, alias = "configProperties")]
    pub config_properties: Vec<AttributeDefinition>,
    #[serde(default)]
    pub transitions: Vec<TransitionDefinition>,
}

/// An ordered key/value attribute pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub key: String,
    pub value: String,
}

/// A pipelet parameter binding: the pipelet's `key` is bound to the pipeline
/// dictionary expression `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDefinition {
    pub key: String,
    #[serde(alias = "value")]
    pub alias: String,
}

/// A declared outgoing edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl NodeDefinition {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}
