//! Splices host imports into a module's function index space.
//!
//! Injected imports are inserted at the front of the import list, so every
//! original function index moves up by one per injection. Passes that emit
//! calls to injected imports get a *logical* index back from
//! [`Injector::add_import`]; the call fixup pass turns those into physical
//! indices with [`Injector::remap`] once injection for the module is over.

use std::collections::HashMap;

use tracing::debug;

use crate::module::{ExportKind, Import, ImportKind, Module};
use crate::types::FuncSig;

/// Namespace of injected imports. Contracts may not import from it.
pub const INJECTED_NAMESPACE: &str = "eosio_injection";

/// Per-module injection session.
#[derive(Debug)]
pub struct Injector {
    /// Size of the function index space before any injection.
    base: u32,
    registered: HashMap<String, u32>,
    /// Logical to physical index.
    mapping: HashMap<u32, u32>,
}

impl Injector {
    pub fn new(module: &Module) -> Self {
        Self {
            base: module.num_functions(),
            registered: HashMap::new(),
            mapping: HashMap::new(),
        }
    }

    /// Import `name` from the injected namespace with signature `sig`,
    /// returning its logical index. Adding a name twice returns the index
    /// from the first call and leaves the module untouched.
    pub fn add_import(&mut self, module: &mut Module, name: &str, sig: &FuncSig) -> u32 {
        if let Some(&logical) = self.registered.get(name) {
            return logical;
        }

        let type_idx = module.intern_type(sig);
        let physical = self.registered.len() as u32;
        let logical = self.base + physical;

        module.imports.insert(
            physical as usize,
            Import {
                module: INJECTED_NAMESPACE.to_string(),
                name: name.to_string(),
                kind: ImportKind::Function(type_idx),
            },
        );

        for export in module.exports.iter_mut() {
            if export.kind == ExportKind::Func {
                export.index += 1;
            }
        }
        if let Some(start) = module.start.as_mut() {
            *start += 1;
        }
        for segment in module.elements.iter_mut() {
            for idx in segment.functions.iter_mut() {
                *idx += 1;
            }
        }

        self.registered.insert(name.to_string(), logical);
        self.mapping.insert(logical, physical);
        debug!(name, logical, physical, "injected import");
        logical
    }

    /// Number of imports injected so far.
    pub fn injected(&self) -> u32 {
        self.registered.len() as u32
    }

    /// Final index for a call target seen in an instrumented body.
    pub fn remap(&self, target: u32) -> u32 {
        match self.mapping.get(&target) {
            Some(&physical) => physical,
            None => target + self.injected(),
        }
    }
}
