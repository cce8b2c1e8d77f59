use crate::definition::{
    AttributeDefinition, BindingDefinition, NodeDefinition, PipelineDefinition,
    TransitionDefinition,
};
use crate::error::ParseError;

const NODE_TAG: &str = "node";
const KEY_BINDING_TAG: &str = "key-binding";
const CONFIG_PROPERTY_TAG: &str = "config-property";
const TRANSITION_TAG: &str = "transition";

// <pipeline name="Product">
//     <node id="start" type="start" name="Show" call-mode="public">
//         <transition target="fetch"/>
//     </node>
//     <node id="fetch" type="pipelet" pipelet="GetProduct">
//         <key-binding key="ProductID" alias="CurrentHttpParameterMap.pid.stringValue"/>
//         <key-binding key="Product" alias="Product"/>
//         <transition target="done"/>
//         <transition target="failed" label="error"/>
//     </node>
//     ...
// </pipeline>
pub(super) fn read(source: &str) -> Result<PipelineDefinition, ParseError> {
    let doc = roxmltree::Document::parse(source)
        .map_err(|e| ParseError::XmlParseError(e.to_string()))?;
    let root = doc.root_element();

    let nodes = root
        .children()
        .filter(|x| x.is_element() && x.tag_name().name() == NODE_TAG)
        .map(read_node)
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(PipelineDefinition {
        name: root.attribute("name").map(ToOwned::to_owned),
        nodes,
    })
}

fn read_node(node: roxmltree::Node<'_, '_>) -> Result<NodeDefinition, ParseError> {
    let id = node.attribute("id").unwrap_or_default().to_string();
    let node_type = node.attribute("type").ok_or_else(|| ParseError::MissingAttribute {
        node_id: id.clone(),
        attribute: "type".to_string(),
    })?;

    let attributes = node
        .attributes()
        .filter(|a| a.name() != "id" && a.name() != "type")
        .map(|a| AttributeDefinition {
            key: a.name().to_string(),
            value: a.value().to_string(),
        })
        .collect();

    let mut definition = NodeDefinition {
        id,
        node_type: node_type.to_string(),
        attributes,
        ..Default::default()
    };

    for child in node.children().filter(roxmltree::Node::is_element) {
        match child.tag_name().name() {
            KEY_BINDING_TAG => definition.key_bindings.push(BindingDefinition {
                key: required(&child, &definition.id, "key")?,
                alias: child.attribute("alias").unwrap_or_default().to_string(),
            }),
            CONFIG_PROPERTY_TAG => definition.config_properties.push(AttributeDefinition {
                key: required(&child, &definition.id, "key")?,
                value: child.attribute("value").unwrap_or_default().to_string(),
            }),
            TRANSITION_TAG => definition.transitions.push(TransitionDefinition {
                target: required(&child, &definition.id, "target")?,
                label: child
                    .attribute("label")
                    .filter(|l| !l.trim().is_empty())
                    .map(ToOwned::to_owned),
            }),
            // Layout hints and descriptions carry no semantics.
            _ => {}
        }
    }

    Ok(definition)
}

fn required(
    element: &roxmltree::Node<'_, '_>,
    node_id: &str,
    attribute: &str,
) -> Result<String, ParseError> {
    element
        .attribute(attribute)
        .map(ToOwned::to_owned)
        .ok_or_else(|| ParseError::MissingAttribute {
            node_id: node_id.to_string(),
            attribute: format!("{}.{}", element.tag_name().name(), attribute),
        })
}
