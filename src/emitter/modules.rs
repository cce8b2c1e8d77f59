//! Where the modules a controller depends on live.

use crate::ast::ModuleRef;
use ahash::AHashSet;
use std::collections::BTreeMap;

/// Config property naming the script a `run-script` action executes.
pub const SCRIPT_KEY: &str = "Script";
/// Config property naming the `Controller-Start` a `call-pipeline` action invokes.
pub const PIPELINE_KEY: &str = "Pipeline";
/// Start invoked when a pipeline reference names none.
pub const DEFAULT_START: &str = "Start";

pub fn isml() -> ModuleRef {
    ModuleRef::new("ISML", "dw/template/ISML")
}

/// `cartridge:path/Name.ds` resolves inside that cartridge's `scripts` folder;
/// a bare path resolves inside the current one.
pub fn script_module(script: &str) -> ModuleRef {
    let (cartridge, path) = match script.split_once(':') {
        Some((cartridge, path)) => (cartridge.trim(), path),
        None => ("~", script),
    };
    let path = path.trim().trim_start_matches('/');
    let path = path
        .strip_suffix(".ds")
        .or_else(|| path.strip_suffix(".js"))
        .unwrap_or(path);
    let module = ModuleRef::from_path(format!("{}/cartridge/scripts/{}", cartridge, path));
    tracing::trace!(script, path = %module.path, "resolved script module");
    module
}

/// Splits `Controller-Start` into the controller module and the start to call.
pub fn controller_module(pipeline: &str) -> (ModuleRef, String) {
    let (controller, start) = match pipeline.split_once('-') {
        Some((controller, start)) if !start.is_empty() => (controller, start),
        Some((controller, _)) => (controller, DEFAULT_START),
        None => (pipeline, DEFAULT_START),
    };
    let controller = controller.trim();
    (
        ModuleRef::new(
            crate::ast::identifier(controller),
            format!("~/cartridge/controllers/{}", controller),
        ),
        start.trim().to_string(),
    )
}

/// The `require`s of one controller file, keyed by path.
///
/// Every module gets a variable name no other module in the file uses: the
/// first module to claim a name keeps it, later ones get a numeric suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    by_path: BTreeMap<String, ModuleRef>,
    taken: AHashSet<String>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `module` unless its path is already present and returns the name
    /// the file refers to it by.
    pub fn insert(&mut self, module: &ModuleRef) -> &str {
        let taken = &mut self.taken;
        let entry = self.by_path.entry(module.path.clone()).or_insert_with(|| {
            let mut alias = module.alias.clone();
            let mut suffix = 2;
            while taken.contains(&alias) {
                alias = format!("{}{}", module.alias, suffix);
                suffix += 1;
            }
            if alias != module.alias {
                tracing::debug!(path = %module.path, %alias, "renamed clashing module");
            }
            taken.insert(alias.clone());
            ModuleRef::new(alias, module.path.clone())
        });
        &entry.alias
    }

    /// The name `module` is known by, or its own alias if it was never added.
    pub fn alias<'m>(&'m self, module: &'m ModuleRef) -> &'m str {
        self.by_path
            .get(&module.path)
            .map_or(module.alias.as_str(), |m| m.alias.as_str())
    }

    /// Modules in path order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRef> {
        self.by_path.values()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
