//! Canonical action kinds and the legacy pipelet names that map onto them.

pub const ASSIGN: &str = "assign";
pub const RUN_SCRIPT: &str = "run-script";
pub const EVALUATE_EXPRESSION: &str = "evaluate-expression";
pub const RETRIEVE_PRODUCT: &str = "retrieve-product";
pub const RETRIEVE_CATEGORY: &str = "retrieve-category";
pub const RETRIEVE_CUSTOMER: &str = "retrieve-customer";
pub const RETRIEVE_ORDER: &str = "retrieve-order";
pub const RETRIEVE_CONTENT: &str = "retrieve-content";
pub const RETRIEVE_ENTITY: &str = "retrieve-entity";
pub const LOG_MESSAGE: &str = "log-message";
pub const CALL_PIPELINE: &str = "call-pipeline";
pub const LOOP_BEGIN: &str = "loop-begin";
pub const LOOP_END: &str = "loop-end";

/// Registry keys for the non-action node variants.
pub const START_NODE: &str = "node:start";
pub const DECISION_NODE: &str = "node:decision";
pub const INTERACTION_NODE: &str = "node:interaction";
pub const END_NODE: &str = "node:end";

/// Binding read by `loop-begin` for the collection being iterated.
pub const LOOP_ITERATOR_KEY: &str = "Iterator";
/// Binding read by `loop-begin` for the per-element variable.
pub const LOOP_ELEMENT_KEY: &str = "Element";

/// Maps a legacy pipelet name to its canonical kind. Names that are already
/// canonical, or unknown, are returned unchanged.
pub fn canonical(pipelet: &str) -> &str {
    match pipelet {
        "Assign" => ASSIGN,
        "Script" | "ExecuteScript" => RUN_SCRIPT,
        "Eval" | "Evaluate" => EVALUATE_EXPRESSION,
        "GetProduct" => RETRIEVE_PRODUCT,
        "GetCategory" => RETRIEVE_CATEGORY,
        "GetCustomer" => RETRIEVE_CUSTOMER,
        "GetOrder" => RETRIEVE_ORDER,
        "GetContent" => RETRIEVE_CONTENT,
        "GetEntity" => RETRIEVE_ENTITY,
        "LogMessage" => LOG_MESSAGE,
        "Call" | "Jump" => CALL_PIPELINE,
        "Loop" | "BeginLoop" => LOOP_BEGIN,
        "EndLoop" => LOOP_END,
        other => other,
    }
}
