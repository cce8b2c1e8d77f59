use super::{ControlFlowBlock, Warning};
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An external module the generated source needs, hoisted as `var <alias> = require('<path>')`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleRef {
    pub path: String,
    pub alias: String,
}

impl ModuleRef {
    pub fn new(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            path: path.into(),
        }
    }

    /// Derives the alias from the last path segment, e.g.
    /// `app_storefront:cart/GetCart.ds` becomes `GetCart`.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let last = path.rsplit(['/', ':']).next().unwrap_or(path.as_str());
        let stem = last.split('.').next().unwrap_or(last);
        let alias = identifier(stem);
        Self { path, alias }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.alias, self.path)
    }
}

/// Turns an arbitrary name into a JavaScript identifier.
pub fn identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// One entry point after structuring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedFunction {
    pub name: String,
    pub start_id: NodeId,
    pub is_public: bool,
    pub is_form_handler: bool,
    pub body: ControlFlowBlock,
    pub required_imports: BTreeSet<ModuleRef>,
}

/// Everything `analyze` derives from a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub functions: Vec<AnalyzedFunction>,
    pub warnings: Vec<Warning>,
}

impl AnalysisResult {
    pub fn function(&self, name: &str) -> Option<&AnalyzedFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn warnings_of(&self, kind: super::WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_is_derived_from_last_segment() {
        assert_eq!(ModuleRef::from_path("dw/catalog/ProductMgr").alias, "ProductMgr");
        assert_eq!(
            ModuleRef::from_path("app_storefront:cart/GetCart.ds").alias,
            "GetCart"
        );
    }

    #[test]
    fn identifiers_are_sanitized() {
        assert_eq!(identifier("Show-Product"), "Show_Product");
        assert_eq!(identifier("3D"), "_3D");
        assert_eq!(identifier(""), "_");
    }
}
