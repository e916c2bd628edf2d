//! Debug printing. Output is buffered in the context and never charged.

use std::fmt::Write as _;

use gasket_runtime::wide;

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::Result;
use crate::name::Name;
use crate::types::Value;
use crate::types::ValueType::{F32, F64, I32, I64};

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("prints", &[I32], None, prints),
    Intrinsic::env("prints_l", &[I32, I32], None, prints_l),
    Intrinsic::env("printi", &[I64], None, printi),
    Intrinsic::env("printui", &[I64], None, printui),
    Intrinsic::env("printsf", &[F32], None, printsf),
    Intrinsic::env("printdf", &[F64], None, printdf),
    Intrinsic::env("printqf", &[I32], None, printqf),
    Intrinsic::env("printn", &[I64], None, printn),
    Intrinsic::env("printhex", &[I32, I32], None, printhex),
];

/// Significant decimal digits that survive a round trip through each type.
const F32_DIGITS: usize = 6;
const F64_DIGITS: usize = 15;

/// C-style scientific notation: `1.500000e+00`, at least two exponent
/// digits, `inf`/`nan` with their sign.
pub fn scientific(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return if value.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    let formatted = format!("{value:.precision$e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

fn prints(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let text = ctx.memory.c_str(Args(args).u32(0)?, usize::MAX)?;
    ctx.console.push_str(&String::from_utf8_lossy(text));
    Ok(None)
}

fn prints_l(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    let text = ctx.memory.slice(a.u32(0)?, a.u32(1)?)?;
    ctx.console.push_str(&String::from_utf8_lossy(text));
    Ok(None)
}

fn printi(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let v = Args(args).i64(0)?;
    let _ = write!(ctx.console, "{v}");
    Ok(None)
}

fn printui(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let v = Args(args).u64(0)?;
    let _ = write!(ctx.console, "{v}");
    Ok(None)
}

fn printsf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let v = Args(args).f32(0)?;
    ctx.console.push_str(&scientific(v as f64, F32_DIGITS));
    Ok(None)
}

fn printdf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let v = Args(args).f64(0)?;
    ctx.console.push_str(&scientific(v, F64_DIGITS));
    Ok(None)
}

// (ptr to binary128): printed at double precision.
fn printqf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let bits = ctx.memory.load_u128(Args(args).u32(0)?)?;
    ctx.console
        .push_str(&scientific(wide::f128_to_f64(bits), F64_DIGITS));
    Ok(None)
}

fn printn(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let name = Name(Args(args).u64(0)?);
    let _ = write!(ctx.console, "{name}");
    Ok(None)
}

fn printhex(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    let data = ctx.memory.slice(a.u32(0)?, a.u32(1)?)?;
    for b in data {
        let _ = write!(ctx.console, "{b:02x}");
    }
    Ok(None)
}
