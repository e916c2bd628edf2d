//! Rewrites call targets once every import for the module is injected.

use tracing::debug;

use crate::injector::Injector;
use crate::module::{Instr, Module};

/// Map logical injected indices to their physical slots and move every
/// other target past the injected imports.
pub fn fixup(module: &mut Module, injector: &Injector) {
    let mut calls = 0usize;
    for function in module.functions.iter_mut() {
        for instr in function.body.iter_mut() {
            if let Instr::Call(target) = instr {
                *target = injector.remap(*target);
                calls += 1;
            }
        }
    }
    debug!(calls, shift = injector.injected(), "call fixup");
}
