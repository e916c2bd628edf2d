//! Per-basic-block gas charging.

use tracing::debug;

use crate::error::Result;
use crate::gas;
use crate::injector::Injector;
use crate::module::{Instr, Module};
use crate::types::{FuncSig, ValueType};

pub const USE_GAS: &str = "use_gas";

/// Opcodes after which control may leave a straight-line run.
pub fn is_boundary(opcode: u8) -> bool {
    matches!(
        opcode,
        0x03 // loop
        | 0x04 // if
        | 0x05 // else
        | 0x0B // end
        | 0x0C // br
        | 0x0D // br_if
        | 0x0E // br_table
        | 0x0F // return
    )
}

/// Inject `use_gas` and charge every run of instructions right before the
/// boundary that ends it. The charge includes the boundary itself.
pub fn inject(module: &mut Module, injector: &mut Injector) -> Result<()> {
    let use_gas = injector.add_import(module, USE_GAS, &FuncSig::new(&[ValueType::I64], None));

    let mut charges = 0usize;
    for function in module.functions.iter_mut() {
        let body = std::mem::take(&mut function.body);
        let mut out = Vec::with_capacity(body.len() + body.len() / 4);
        let mut pending = 0u64;

        for instr in body {
            pending += gas::cost(instr.opcode());
            if is_boundary(instr.opcode()) && pending > 0 {
                out.push(Instr::i64_const(pending as i64));
                out.push(Instr::Call(use_gas));
                pending = 0;
                charges += 1;
            }
            out.push(instr);
        }
        function.body = out;
    }

    debug!(charges, "gas pass");
    Ok(())
}
