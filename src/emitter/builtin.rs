use super::modules::{self, PIPELINE_KEY, SCRIPT_KEY};
use super::{EmittedCode, EmitterContext, LocalTarget, NodeEmitter};
use crate::ast::{ModuleRef, identifier};
use crate::graph::{Node, NodeKind, kinds};
use ahash::AHashMap;
use itertools::Itertools;

/// Quotes `text` as a single-quoted JavaScript string literal.
pub(crate) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Records a local's declaration (if any) on `code`.
fn record(code: &mut EmittedCode, target: &LocalTarget) {
    if let Some(name) = &target.declares {
        code.declares.push(name.clone());
    }
}

/// Line that turns a failed lookup into an exception for the enclosing `try`.
fn fail_if_missing(reference: &str, kind: &str) -> String {
    format!("if (!{}) {{ throw new Error({}); }}", reference, quote(&format!("{} failed", kind)))
}

/// Master macro for the manager lookups: one input binding, one manager call,
/// one output binding.
macro_rules! define_retrieval_emitters {
    ( $( ($struct_name:ident, $kind:expr, $alias:expr, $path:expr, $method:expr, $input:expr, $output:expr) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl NodeEmitter for $struct_name {
                fn kind(&self) -> &str { $kind }
                fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
                    let Some(action) = node.action() else { return EmittedCode::default(); };
                    let input = ctx.expr(action.binding($input).unwrap_or($input));
                    let target = ctx.assign_target(action.binding($output).unwrap_or($output));
                    let module = ModuleRef::new($alias, $path);
                    let mut code = EmittedCode::line(format!("{} = {}.{}({});", target, ctx.module(&module), $method, input))
                        .import(module);
                    if action.has_error_branch {
                        code.push(fail_if_missing(&target, $kind));
                    }
                    code
                }
            }
        )*

        fn register_retrieval_emitters(registry: &mut AHashMap<String, Box<dyn NodeEmitter>>) {
            $( registry.insert($kind.to_string(), Box::new($struct_name)); )*
        }

        fn create_retrieval_emitter(kind: &str) -> Option<Box<dyn NodeEmitter>> {
            $( if kind == $kind { return Some(Box::new($struct_name)); } )*
            None
        }
    };
}

define_retrieval_emitters! {
    (RetrieveProductEmitter, kinds::RETRIEVE_PRODUCT, "ProductMgr", "dw/catalog/ProductMgr", "getProduct", "ProductID", "Product"),
    (RetrieveCategoryEmitter, kinds::RETRIEVE_CATEGORY, "CatalogMgr", "dw/catalog/CatalogMgr", "getCategory", "CategoryID", "Category"),
    (RetrieveCustomerEmitter, kinds::RETRIEVE_CUSTOMER, "CustomerMgr", "dw/customer/CustomerMgr", "getCustomerByCustomerNumber", "CustomerNo", "Customer"),
    (RetrieveOrderEmitter, kinds::RETRIEVE_ORDER, "OrderMgr", "dw/order/OrderMgr", "getOrder", "OrderNo", "Order"),
    (RetrieveContentEmitter, kinds::RETRIEVE_CONTENT, "ContentMgr", "dw/content/ContentMgr", "getContent", "ContentID", "Content"),
}

/// `From_N` / `To_N` pairs, assigned in slot order.
struct AssignEmitter;
impl NodeEmitter for AssignEmitter {
    fn kind(&self) -> &str {
        kinds::ASSIGN
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let Some(action) = node.action() else {
            return EmittedCode::default();
        };
        let mut code = EmittedCode::default();
        for (from, to) in action.positional_pairs("From_", "To_") {
            code.push(format!("{} = {};", ctx.assign_target(to), ctx.expr(from)));
        }
        code
    }
}

/// Runs a script module with the node's bindings as its argument object.
struct RunScriptEmitter;
impl NodeEmitter for RunScriptEmitter {
    fn kind(&self) -> &str {
        kinds::RUN_SCRIPT
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let Some(action) = node.action() else {
            return EmittedCode::default();
        };
        let Some(script) = action.config(SCRIPT_KEY) else {
            return EmittedCode::line(format!("/* run-script '{}' names no script */", node.id));
        };
        let module = modules::script_module(script);
        let name = ctx.module(&module);

        let fields = action
            .key_bindings
            .iter()
            .map(|(key, alias)| format!("{}: {}", identifier(key), ctx.expr(alias)))
            .join(", ");
        let args = ctx.local("scriptArgs");
        let mut code = EmittedCode::line(format!("{} = {{ {} }};", args.lhs, fields));
        record(&mut code, &args);

        if action.has_error_branch {
            let status = ctx.local("status");
            code.push(format!("{} = {}.execute(scriptArgs);", status.lhs, name));
            code.push(format!(
                "if (status === PIPELET_ERROR) {{ throw new Error({}); }}",
                quote(&format!("{} failed", script))
            ));
            record(&mut code, &status);
        } else {
            code.push(format!("{}.execute(scriptArgs);", name));
        }
        code.import(module)
    }
}

struct EvaluateExpressionEmitter;
impl NodeEmitter for EvaluateExpressionEmitter {
    fn kind(&self) -> &str {
        kinds::EVALUATE_EXPRESSION
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let Some(action) = node.action() else {
            return EmittedCode::default();
        };
        let Some(expression) = action
            .binding("Expression")
            .or_else(|| action.config("Expression"))
        else {
            return EmittedCode::default();
        };
        let value = ctx.expr(expression);
        match action.binding("Result") {
            Some(result) => EmittedCode::line(format!("{} = {};", ctx.assign_target(result), value)),
            None => EmittedCode::line(format!("{};", value)),
        }
    }
}

/// Custom object lookup by type and key.
struct RetrieveEntityEmitter;
impl NodeEmitter for RetrieveEntityEmitter {
    fn kind(&self) -> &str {
        kinds::RETRIEVE_ENTITY
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let Some(action) = node.action() else {
            return EmittedCode::default();
        };
        let object_type = quote(action.config("Type").unwrap_or_default());
        let key = ctx.expr(action.binding("KeyValue").unwrap_or("KeyValue"));
        let target = ctx.assign_target(action.binding("CustomObject").unwrap_or("CustomObject"));
        let module = ModuleRef::new("CustomObjectMgr", "dw/object/CustomObjectMgr");
        let mut code = EmittedCode::line(format!(
            "{} = {}.getCustomObject({}, {});",
            target,
            ctx.module(&module),
            object_type,
            key
        ))
        .import(module);
        if action.has_error_branch {
            code.push(fail_if_missing(&target, kinds::RETRIEVE_ENTITY));
        }
        code
    }
}

struct LogMessageEmitter;
impl NodeEmitter for LogMessageEmitter {
    fn kind(&self) -> &str {
        kinds::LOG_MESSAGE
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let Some(action) = node.action() else {
            return EmittedCode::default();
        };
        let level = match action.config("Level").map(str::to_ascii_lowercase).as_deref() {
            Some("debug") => "debug",
            Some("warn") | Some("warning") => "warn",
            Some("error") => "error",
            Some("fatal") => "fatal",
            _ => "info",
        };
        let message = action
            .config("Message")
            .or_else(|| action.binding("Message"))
            .unwrap_or_default();
        let logger = ModuleRef::new("Logger", "dw/system/Logger");
        EmittedCode::line(format!("{}.{}({});", ctx.module(&logger), level, quote(message))).import(logger)
    }
}

/// Delegates to another controller's start with the current dictionary.
struct CallPipelineEmitter;
impl NodeEmitter for CallPipelineEmitter {
    fn kind(&self) -> &str {
        kinds::CALL_PIPELINE
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let Some(pipeline) = node.action().and_then(|a| a.config(PIPELINE_KEY)) else {
            return EmittedCode::line(format!("/* call-pipeline '{}' names no pipeline */", node.id));
        };
        let (module, start) = modules::controller_module(pipeline);
        EmittedCode::line(format!("{}.{}(pdict);", ctx.module(&module), identifier(&start))).import(module)
    }
}

/// Only reached when a `loop-begin` could not be paired with its `loop-end`.
struct LoopBeginEmitter;
impl NodeEmitter for LoopBeginEmitter {
    fn kind(&self) -> &str {
        kinds::LOOP_BEGIN
    }

    fn emit(&self, node: &Node, _ctx: &EmitterContext) -> EmittedCode {
        let iterator = node.action()
            .and_then(|a| a.binding(kinds::LOOP_ITERATOR_KEY))
            .unwrap_or_default();
        EmittedCode::line(format!("/* loop over {} without a matching loop-end */", iterator))
    }
}

struct LoopEndEmitter;
impl NodeEmitter for LoopEndEmitter {
    fn kind(&self) -> &str {
        kinds::LOOP_END
    }

    fn emit(&self, _node: &Node, _ctx: &EmitterContext) -> EmittedCode {
        EmittedCode::default()
    }
}

struct InteractionEmitter;
impl NodeEmitter for InteractionEmitter {
    fn kind(&self) -> &str {
        kinds::INTERACTION_NODE
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let NodeKind::Interaction { template } = &node.kind else {
            return EmittedCode::default();
        };
        let isml = modules::isml();
        EmittedCode::line(format!("{}.renderTemplate({}, pdict);", ctx.module(&isml), quote(template))).import(isml)
    }
}

struct EndEmitter;
impl NodeEmitter for EndEmitter {
    fn kind(&self) -> &str {
        kinds::END_NODE
    }

    fn emit(&self, node: &Node, _ctx: &EmitterContext) -> EmittedCode {
        match &node.kind {
            NodeKind::End { name: Some(name) } if !name.is_empty() => {
                EmittedCode::line(format!("return {};", quote(name)))
            }
            _ => EmittedCode::line("return;"),
        }
    }
}

/// Decisions are normally folded into `if` / `while`; this covers the ones
/// that end up as plain statements.
struct DecisionEmitter;
impl NodeEmitter for DecisionEmitter {
    fn kind(&self) -> &str {
        kinds::DECISION_NODE
    }

    fn emit(&self, node: &Node, ctx: &EmitterContext) -> EmittedCode {
        let NodeKind::Decision { condition } = &node.kind else {
            return EmittedCode::default();
        };
        EmittedCode::line(format!("/* decision: {} */", ctx.expr(condition)))
    }
}

struct StartEmitter;
impl NodeEmitter for StartEmitter {
    fn kind(&self) -> &str {
        kinds::START_NODE
    }

    fn emit(&self, _node: &Node, _ctx: &EmitterContext) -> EmittedCode {
        EmittedCode::default()
    }
}

/// Emitters written out by hand, in registration order.
fn other_emitters() -> Vec<Box<dyn NodeEmitter>> {
    vec![
        Box::new(AssignEmitter),
        Box::new(RunScriptEmitter),
        Box::new(EvaluateExpressionEmitter),
        Box::new(RetrieveEntityEmitter),
        Box::new(LogMessageEmitter),
        Box::new(CallPipelineEmitter),
        Box::new(LoopBeginEmitter),
        Box::new(LoopEndEmitter),
        Box::new(InteractionEmitter),
        Box::new(EndEmitter),
        Box::new(DecisionEmitter),
        Box::new(StartEmitter),
    ]
}

pub(super) fn register_builtin_emitters(registry: &mut AHashMap<String, Box<dyn NodeEmitter>>) {
    register_retrieval_emitters(registry);
    for emitter in other_emitters() {
        registry.insert(emitter.kind().to_string(), emitter);
    }
}

pub(super) fn create_emitter_by_kind(kind: &str) -> Option<Box<dyn NodeEmitter>> {
    create_retrieval_emitter(kind).or_else(|| other_emitters().into_iter().find(|e| e.kind() == kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{ExpressionTransformer, ImportTable};
    use crate::graph::{ActionNode, Transition};

    fn action(kind: &str, bindings: &[(&str, &str)], config: &[(&str, &str)], guarded: bool) -> Node {
        let pairs = |p: &[(&str, &str)]| p.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Node {
            id: "a1".to_string(),
            kind: NodeKind::Action(ActionNode {
                kind: kind.to_string(),
                key_bindings: pairs(bindings),
                config_properties: pairs(config),
                has_error_branch: guarded,
            }),
            transitions: vec![Transition::new("next")],
        }
    }

    fn emit(node: &Node, declared: &[&str]) -> EmittedCode {
        emit_with(node, declared, &ImportTable::default())
    }

    fn emit_with(node: &Node, declared: &[&str], modules: &ImportTable) -> EmittedCode {
        let declared: ahash::AHashSet<String> = declared.iter().map(|d| d.to_string()).collect();
        let transformer = ExpressionTransformer::new();
        let ctx = EmitterContext {
            depth: 1,
            declared: &declared,
            transformer: &transformer,
            modules,
        };
        let mut registry = AHashMap::new();
        register_builtin_emitters(&mut registry);
        let kind = crate::emitter::emitter_kind(node);
        registry[kind].emit(node, &ctx)
    }

    #[test]
    fn test_retrieve_product() {
        let node = action(
            kinds::RETRIEVE_PRODUCT,
            &[("ProductID", "CurrentHttpParameterMap.pid.stringValue"), ("Product", "Product")],
            &[],
            false,
        );
        let code = emit(&node, &[]);
        assert_eq!(
            code.lines,
            vec!["pdict.Product = ProductMgr.getProduct(request.httpParameterMap.pid.stringValue);"]
        );
        assert_eq!(code.imports, vec![ModuleRef::new("ProductMgr", "dw/catalog/ProductMgr")]);
        assert!(code.declares.is_empty());
    }

    #[test]
    fn test_guarded_retrieval_throws() {
        let node = action(kinds::RETRIEVE_ORDER, &[("OrderNo", "OrderNo")], &[], true);
        let code = emit(&node, &[]);
        assert_eq!(code.lines[0], "pdict.Order = OrderMgr.getOrder(pdict.OrderNo);");
        assert_eq!(code.lines[1], "if (!pdict.Order) { throw new Error('retrieve-order failed'); }");
    }

    #[test]
    fn test_assign_pairs_in_slot_order() {
        let node = action(
            kinds::ASSIGN,
            &[("From_0", "Basket.total"), ("To_0", "Total"), ("From_1", "Item.price * 2"), ("To_1", "Double")],
            &[],
            false,
        );
        let code = emit(&node, &["Item"]);
        assert_eq!(
            code.lines,
            vec!["pdict.Total = pdict.Basket.total;", "pdict.Double = Item.price * 2;"]
        );
        assert!(code.declares.is_empty());
    }

    #[test]
    fn test_run_script_with_error_branch() {
        let node = action(
            kinds::RUN_SCRIPT,
            &[("Basket", "Basket")],
            &[(SCRIPT_KEY, "app_storefront:cart/Calculate.ds")],
            true,
        );
        let code = emit(&node, &[]);
        assert_eq!(
            code.lines,
            vec![
                "var scriptArgs = { Basket: pdict.Basket };",
                "var status = Calculate.execute(scriptArgs);",
                "if (status === PIPELET_ERROR) { throw new Error('app_storefront:cart/Calculate.ds failed'); }",
            ]
        );
        assert_eq!(code.imports[0].path, "app_storefront/cartridge/scripts/cart/Calculate");
    }

    #[test]
    fn test_end_and_interaction() {
        let end = Node {
            id: "e".to_string(),
            kind: NodeKind::End {
                name: Some("Success".to_string()),
            },
            transitions: vec![],
        };
        assert_eq!(emit(&end, &[]).lines, vec!["return 'Success';"]);

        let page = Node {
            id: "i".to_string(),
            kind: NodeKind::Interaction {
                template: "product/product".to_string(),
            },
            transitions: vec![],
        };
        let code = emit(&page, &[]);
        assert_eq!(code.lines, vec!["ISML.renderTemplate('product/product', pdict);"]);
        assert_eq!(code.imports, vec![modules::isml()]);
    }

    #[test]
    fn test_call_pipeline() {
        let node = action(kinds::CALL_PIPELINE, &[], &[(PIPELINE_KEY, "Cart-Show")], false);
        let code = emit(&node, &[]);
        assert_eq!(code.lines, vec!["Cart.Show(pdict);"]);
        assert_eq!(code.imports[0].path, "~/cartridge/controllers/Cart");
    }

    #[test]
    fn test_log_message_quotes_text() {
        let node = action(kinds::LOG_MESSAGE, &[], &[("Message", "can't find it"), ("Level", "WARN")], false);
        assert_eq!(emit(&node, &[]).lines, vec!["Logger.warn('can\\'t find it');"]);
    }

    #[test]
    fn test_calls_use_the_final_module_name() {
        let mut modules = ImportTable::new();
        modules.insert(&modules::script_module("app_one:cart/Calculate.ds"));
        modules.insert(&modules::script_module("app_two:tax/Calculate.ds"));

        let node = action(
            kinds::RUN_SCRIPT,
            &[("Basket", "Basket")],
            &[(SCRIPT_KEY, "app_two:tax/Calculate.ds")],
            false,
        );
        let code = emit_with(&node, &[], &modules);
        assert_eq!(
            code.lines,
            vec!["var scriptArgs = { Basket: pdict.Basket };", "Calculate2.execute(scriptArgs);"]
        );
        assert_eq!(code.imports[0].alias, "Calculate");
    }
}
