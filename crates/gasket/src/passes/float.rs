//! Replaces native float instructions with calls into the software-float
//! intrinsics.
//!
//! Loads, stores, constants and reinterprets move bits without rounding
//! and are left alone. Everything else that touches a float value is
//! killed and replaced by a `call` of the same stack signature.

use tracing::debug;

use crate::error::{Error, Result};
use crate::injector::{Injector, INJECTED_NAMESPACE};
use crate::intrinsics;
use crate::module::{Instr, Module};

/// Whether an opcode computes on float values.
pub fn is_float_op(opcode: u8) -> bool {
    matches!(opcode, 0x5B..=0x66 | 0x8B..=0xA6 | 0xA8..=0xAB | 0xAE..=0xBB)
}

/// Injected symbol implementing a float opcode.
pub fn symbol(opcode: u8) -> Option<&'static str> {
    Some(match opcode {
        0x5B => "_eosio_f32_eq",
        0x5C => "_eosio_f32_ne",
        0x5D => "_eosio_f32_lt",
        0x5E => "_eosio_f32_gt",
        0x5F => "_eosio_f32_le",
        0x60 => "_eosio_f32_ge",
        0x61 => "_eosio_f64_eq",
        0x62 => "_eosio_f64_ne",
        0x63 => "_eosio_f64_lt",
        0x64 => "_eosio_f64_gt",
        0x65 => "_eosio_f64_le",
        0x66 => "_eosio_f64_ge",

        0x8B => "_eosio_f32_abs",
        0x8C => "_eosio_f32_neg",
        0x8D => "_eosio_f32_ceil",
        0x8E => "_eosio_f32_floor",
        0x8F => "_eosio_f32_trunc",
        0x90 => "_eosio_f32_nearest",
        0x91 => "_eosio_f32_sqrt",
        0x92 => "_eosio_f32_add",
        0x93 => "_eosio_f32_sub",
        0x94 => "_eosio_f32_mul",
        0x95 => "_eosio_f32_div",
        0x96 => "_eosio_f32_min",
        0x97 => "_eosio_f32_max",
        0x98 => "_eosio_f32_copysign",

        0x99 => "_eosio_f64_abs",
        0x9A => "_eosio_f64_neg",
        0x9B => "_eosio_f64_ceil",
        0x9C => "_eosio_f64_floor",
        0x9D => "_eosio_f64_trunc",
        0x9E => "_eosio_f64_nearest",
        0x9F => "_eosio_f64_sqrt",
        0xA0 => "_eosio_f64_add",
        0xA1 => "_eosio_f64_sub",
        0xA2 => "_eosio_f64_mul",
        0xA3 => "_eosio_f64_div",
        0xA4 => "_eosio_f64_min",
        0xA5 => "_eosio_f64_max",
        0xA6 => "_eosio_f64_copysign",

        0xA8 => "_eosio_f32_trunc_i32s",
        0xA9 => "_eosio_f32_trunc_i32u",
        0xAA => "_eosio_f64_trunc_i32s",
        0xAB => "_eosio_f64_trunc_i32u",
        0xAE => "_eosio_f32_trunc_i64s",
        0xAF => "_eosio_f32_trunc_i64u",
        0xB0 => "_eosio_f64_trunc_i64s",
        0xB1 => "_eosio_f64_trunc_i64u",

        0xB2 => "_eosio_i32_to_f32",
        0xB3 => "_eosio_ui32_to_f32",
        0xB4 => "_eosio_i64_to_f32",
        0xB5 => "_eosio_ui64_to_f32",
        0xB6 => "_eosio_f64_demote",
        0xB7 => "_eosio_i32_to_f64",
        0xB8 => "_eosio_ui32_to_f64",
        0xB9 => "_eosio_i64_to_f64",
        0xBA => "_eosio_ui64_to_f64",
        0xBB => "_eosio_f32_promote",

        _ => return None,
    })
}

pub fn inject(module: &mut Module, injector: &mut Injector) -> Result<()> {
    let mut replaced = 0usize;
    // Bodies are taken out so the injector can mutate the module meanwhile.
    let mut functions = std::mem::take(&mut module.functions);
    let result = functions.iter_mut().try_for_each(|function| {
        for instr in function.body.iter_mut() {
            let opcode = instr.opcode();
            if !is_float_op(opcode) {
                continue;
            }
            let intrinsic = symbol(opcode)
                .and_then(|name| intrinsics::lookup(INJECTED_NAMESPACE, name))
                .ok_or_else(|| {
                    Error::runtime(format!("unknown opcode in injection: 0x{opcode:02x}"))
                })?;
            let idx = injector.add_import(module, intrinsic.name, &intrinsic.sig());
            *instr = Instr::Call(idx);
            replaced += 1;
        }
        Ok::<(), Error>(())
    });
    module.functions = functions;
    result?;

    debug!(replaced, injected = injector.injected(), "float pass");
    Ok(())
}
