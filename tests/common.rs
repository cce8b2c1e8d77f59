//! Common test utilities: pipeline documents and node builders.
use pipeflow::prelude::*;

/// The canonical product page.
///
/// Logic: `ProductID != null` ? fetch product, render page : render not-found page
#[allow(dead_code)]
pub const PRODUCT_XML: &str = r#"
<pipeline name="Product">
    <node id="start" type="start" name="Show" call-mode="public">
        <transition target="check"/>
    </node>
    <node id="check" type="decision" condition="ProductID != null">
        <transition target="fetch" label="true"/>
        <transition target="missing" label="false"/>
    </node>
    <node id="fetch" type="pipelet" pipelet="GetProduct">
        <key-binding key="ProductID" alias="ProductID"/>
        <key-binding key="Product" alias="Product"/>
        <transition target="show"/>
    </node>
    <node id="show" type="interaction" template="product/product"/>
    <node id="missing" type="interaction" template="error/notfound"/>
</pipeline>
"#;

/// The same pipeline as `PRODUCT_XML`, as JSON.
#[allow(dead_code)]
pub const PRODUCT_JSON: &str = r#"{
    "name": "Product",
    "nodes": [
        { "id": "start", "type": "start",
          "attributes": [ { "key": "name", "value": "Show" }, { "key": "call-mode", "value": "public" } ],
          "transitions": [ { "target": "check" } ] },
        { "id": "check", "type": "decision",
          "attributes": [ { "key": "condition", "value": "ProductID != null" } ],
          "transitions": [ { "target": "fetch", "label": "true" }, { "target": "missing", "label": "false" } ] },
        { "id": "fetch", "type": "pipelet",
          "attributes": [ { "key": "pipelet", "value": "GetProduct" } ],
          "keyBindings": [ { "key": "ProductID", "alias": "ProductID" }, { "key": "Product", "alias": "Product" } ],
          "transitions": [ { "target": "show" } ] },
        { "id": "show", "type": "interaction",
          "attributes": [ { "key": "template", "value": "product/product" } ] },
        { "id": "missing", "type": "interaction",
          "attributes": [ { "key": "template", "value": "error/notfound" } ] }
    ]
}"#;

/// The smallest complete lookup: fetch the product and finish, or show the
/// not-found page.
#[allow(dead_code)]
pub const GET_PRODUCT_XML: &str = r#"
<pipeline name="Product">
    <node id="start" type="start" name="GetProduct">
        <transition target="check"/>
    </node>
    <node id="check" type="decision" condition="ProductID != null">
        <transition target="fetch" label="true"/>
        <transition target="missing" label="false"/>
    </node>
    <node id="fetch" type="pipelet" pipelet="retrieve-product">
        <key-binding key="ProductID" alias="ProductID"/>
        <key-binding key="Product" alias="Product"/>
        <transition target="done"/>
    </node>
    <node id="done" type="end" name="Success"/>
    <node id="missing" type="interaction" template="error/notfound"/>
</pipeline>
"#;

/// A form page whose submit and cancel transitions continue on the next request.
#[allow(dead_code)]
pub const FORM_XML: &str = r#"
<pipeline name="Account">
    <node id="start" type="start" name="Edit" call-mode="public">
        <transition target="page"/>
    </node>
    <node id="page" type="interaction" template="account/edit">
        <transition target="save" label="submit"/>
        <transition target="done" label="cancel"/>
    </node>
    <node id="save" type="pipelet" pipelet="Assign">
        <key-binding key="From_0" alias="CurrentForms.profile.email.value"/>
        <key-binding key="To_0" alias="Email"/>
        <transition target="done"/>
    </node>
    <node id="done" type="end" name="Saved"/>
</pipeline>
"#;

/// Two scripts from different cartridges that share a file name.
#[allow(dead_code)]
pub const CLASHING_SCRIPTS_XML: &str = r#"
<pipeline name="Checkout">
    <node id="start" type="start" name="Totals">
        <transition target="cart"/>
    </node>
    <node id="cart" type="pipelet" pipelet="Script">
        <config-property key="Script" value="app_one:cart/Calculate.ds"/>
        <key-binding key="Basket" alias="Basket"/>
        <transition target="tax"/>
    </node>
    <node id="tax" type="pipelet" pipelet="Script">
        <config-property key="Script" value="app_two:tax/Calculate.ds"/>
        <key-binding key="Basket" alias="Basket"/>
        <transition target="done"/>
    </node>
    <node id="done" type="end"/>
</pipeline>
"#;

/// A loop-begin / loop-end pair around three actions, then an end node.
#[allow(dead_code)]
pub const LOOP_XML: &str = r#"
<pipeline name="Basket">
    <node id="start" type="start" name="Recalculate">
        <transition target="loop"/>
    </node>
    <node id="loop" type="pipelet" pipelet="Loop">
        <key-binding key="Iterator" alias="Basket.productLineItems"/>
        <key-binding key="Element" alias="Item"/>
        <transition target="copy"/>
    </node>
    <node id="copy" type="pipelet" pipelet="Assign">
        <key-binding key="From_0" alias="Item.quantityValue"/>
        <key-binding key="To_0" alias="Quantity"/>
        <transition target="double"/>
    </node>
    <node id="double" type="pipelet" pipelet="Eval">
        <key-binding key="Expression" alias="Quantity * 2"/>
        <key-binding key="Result" alias="Doubled"/>
        <transition target="log"/>
    </node>
    <node id="log" type="pipelet" pipelet="LogMessage">
        <config-property key="Message" value="line item processed"/>
        <transition target="next"/>
    </node>
    <node id="next" type="pipelet" pipelet="EndLoop">
        <transition target="loop"/>
        <transition target="done"/>
    </node>
    <node id="done" type="end" name="Success"/>
</pipeline>
"#;

/// A guarded lookup: the error transition leads to the not-found page.
#[allow(dead_code)]
pub const ERROR_BRANCH_XML: &str = r#"
<pipeline name="Order">
    <node id="start" type="start" name="Detail" call-mode="public">
        <transition target="fetch"/>
    </node>
    <node id="fetch" type="pipelet" pipelet="GetOrder">
        <key-binding key="OrderNo" alias="CurrentHttpParameterMap.orderNo.stringValue"/>
        <key-binding key="Order" alias="Order"/>
        <transition target="show"/>
        <transition target="notfound" label="error"/>
    </node>
    <node id="show" type="interaction" template="account/order"/>
    <node id="notfound" type="interaction" template="error/notfound"/>
</pipeline>
"#;

/// A start whose only reachable node is the not-found page.
#[allow(dead_code)]
pub const DEAD_END_XML: &str = r#"
<pipeline name="Legacy">
    <node id="start" type="start" name="Gone">
        <transition target="nf"/>
    </node>
    <node id="nf" type="interaction" template="error/notfound"/>
</pipeline>
"#;

/// `tail` is reached from both branches of `d`, but `x` can also leave
/// without passing through it, so `tail` is not a merge point.
#[allow(dead_code)]
pub const SHARED_TAIL_XML: &str = r#"
<pipeline name="Shared">
    <node id="start" type="start" name="Run">
        <transition target="d"/>
    </node>
    <node id="d" type="decision" condition="Mode == 'a'">
        <transition target="a" label="true"/>
        <transition target="b" label="false"/>
    </node>
    <node id="a" type="pipelet" pipelet="LogMessage">
        <config-property key="Message" value="a"/>
        <transition target="x"/>
    </node>
    <node id="x" type="decision" condition="Ready">
        <transition target="tail" label="yes"/>
        <transition target="early" label="no"/>
    </node>
    <node id="b" type="pipelet" pipelet="LogMessage">
        <config-property key="Message" value="b"/>
        <transition target="tail"/>
    </node>
    <node id="tail" type="pipelet" pipelet="Assign">
        <key-binding key="From_0" alias="true"/>
        <key-binding key="To_0" alias="Done"/>
        <transition target="finish"/>
    </node>
    <node id="finish" type="end" name="Success"/>
    <node id="early" type="end" name="Early"/>
</pipeline>
"#;

/// `p` and `q` form a cycle entered from both sides.
#[allow(dead_code)]
pub const IRREDUCIBLE_XML: &str = r#"
<pipeline name="Tangle">
    <node id="start" type="start" name="Run">
        <transition target="d"/>
    </node>
    <node id="d" type="decision" condition="FromTop">
        <transition target="p" label="true"/>
        <transition target="q" label="false"/>
    </node>
    <node id="p" type="pipelet" pipelet="LogMessage">
        <config-property key="Message" value="p"/>
        <transition target="q"/>
    </node>
    <node id="q" type="decision" condition="More">
        <transition target="p" label="true"/>
        <transition target="done" label="false"/>
    </node>
    <node id="done" type="end"/>
</pipeline>
"#;

/// A counting loop built from a decision and a back edge.
#[allow(dead_code)]
pub const WHILE_XML: &str = r#"
<pipeline name="Counter">
    <node id="start" type="start" name="Count">
        <transition target="check"/>
    </node>
    <node id="check" type="decision" condition="Count &lt; 10">
        <transition target="inc" label="true"/>
        <transition target="done" label="false"/>
    </node>
    <node id="inc" type="pipelet" pipelet="Assign">
        <key-binding key="From_0" alias="Count + 1"/>
        <key-binding key="To_0" alias="Count"/>
        <transition target="check"/>
    </node>
    <node id="done" type="end" name="Done"/>
</pipeline>
"#;

/// Two entry points sharing a subroutine-like tail, one calling another controller.
#[allow(dead_code)]
pub const TWO_STARTS_XML: &str = r#"
<pipeline name="Cart">
    <node id="show" type="start" name="Show" call-mode="public">
        <transition target="calc"/>
    </node>
    <node id="add" type="start" name="AddProduct" call-mode="private" form-handler="true">
        <transition target="calc"/>
    </node>
    <node id="calc" type="pipelet" pipelet="Script">
        <config-property key="Script" value="app_storefront:cart/Calculate.ds"/>
        <key-binding key="Basket" alias="Basket"/>
        <transition target="page"/>
    </node>
    <node id="page" type="interaction" template="checkout/cart"/>
    <node id="orphan" type="pipelet" pipelet="Call">
        <config-property key="Pipeline" value="Home-Show"/>
        <transition target="page"/>
    </node>
</pipeline>
"#;

/// Builds a start node.
#[allow(dead_code)]
pub fn start(id: &str, name: &str, next: &str) -> Node {
    Node {
        id: id.to_string(),
        kind: NodeKind::Start(pipeflow::graph::StartNode {
            name: name.to_string(),
            is_public: true,
            is_form_handler: false,
        }),
        transitions: vec![Transition::new(next)],
    }
}

/// Builds an action node of `kind` with the given transitions.
#[allow(dead_code)]
pub fn action(id: &str, kind: &str, transitions: Vec<Transition>) -> Node {
    let has_error_branch = transitions.iter().any(Transition::is_error);
    Node {
        id: id.to_string(),
        kind: NodeKind::Action(pipeflow::graph::ActionNode {
            kind: kind.to_string(),
            has_error_branch,
            ..Default::default()
        }),
        transitions,
    }
}

/// Builds a decision node with labeled `true` / `false` branches.
#[allow(dead_code)]
pub fn decision(id: &str, condition: &str, then: &str, otherwise: &str) -> Node {
    Node {
        id: id.to_string(),
        kind: NodeKind::Decision {
            condition: condition.to_string(),
        },
        transitions: vec![
            Transition::labeled(then, "true"),
            Transition::labeled(otherwise, "false"),
        ],
    }
}

/// Builds an end node.
#[allow(dead_code)]
pub fn end(id: &str) -> Node {
    Node {
        id: id.to_string(),
        kind: NodeKind::End { name: None },
        transitions: vec![],
    }
}

/// Counts how often each reachable id is covered by a function body.
#[allow(dead_code)]
pub fn coverage(body: &ControlFlowBlock) -> std::collections::BTreeMap<String, usize> {
    let mut counts = std::collections::BTreeMap::new();
    for id in body.covered_ids() {
        *counts.entry(id.to_string()).or_insert(0) += 1;
    }
    counts
}
