//! Compiler runtime helpers for 128-bit integers and `long double`.
//!
//! wasm32 has neither, so clang lowers them to these calls. A 128-bit
//! argument arrives as two `i64` halves, low first; a 128-bit result is
//! written through a pointer passed as the first argument. Every helper
//! costs [`CALL_BASE`].

use gasket_runtime::softfloat::{F128, F32, F64};
use gasket_runtime::wide;

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::Result;
use crate::gas::CALL_BASE;
use crate::types::ValueType::{F32 as TF32, F64 as TF64, I32, I64};
use crate::types::{Value, ValueType};

const RET_WIDE: &[ValueType] = &[I32, I64, I64];
const RET_TWO_WIDE: &[ValueType] = &[I32, I64, I64, I64, I64];
const SHIFT: &[ValueType] = &[I32, I64, I64, I32];
const WIDE: &[ValueType] = &[I64, I64];
const TWO_WIDE: &[ValueType] = &[I64, I64, I64, I64];

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("__ashlti3", SHIFT, None, ashlti3),
    Intrinsic::env("__ashrti3", SHIFT, None, ashrti3),
    Intrinsic::env("__lshlti3", SHIFT, None, lshlti3),
    Intrinsic::env("__lshrti3", SHIFT, None, lshrti3),
    Intrinsic::env("__divti3", RET_TWO_WIDE, None, divti3),
    Intrinsic::env("__udivti3", RET_TWO_WIDE, None, udivti3),
    Intrinsic::env("__modti3", RET_TWO_WIDE, None, modti3),
    Intrinsic::env("__umodti3", RET_TWO_WIDE, None, umodti3),
    Intrinsic::env("__multi3", RET_TWO_WIDE, None, multi3),
    Intrinsic::env("__addtf3", RET_TWO_WIDE, None, addtf3),
    Intrinsic::env("__subtf3", RET_TWO_WIDE, None, subtf3),
    Intrinsic::env("__multf3", RET_TWO_WIDE, None, multf3),
    Intrinsic::env("__divtf3", RET_TWO_WIDE, None, divtf3),
    Intrinsic::env("__negtf2", RET_WIDE, None, negtf2),
    Intrinsic::env("__eqtf2", TWO_WIDE, Some(I32), eqtf2),
    Intrinsic::env("__netf2", TWO_WIDE, Some(I32), netf2),
    Intrinsic::env("__getf2", TWO_WIDE, Some(I32), getf2),
    Intrinsic::env("__gttf2", TWO_WIDE, Some(I32), gttf2),
    Intrinsic::env("__letf2", TWO_WIDE, Some(I32), letf2),
    Intrinsic::env("__lttf2", TWO_WIDE, Some(I32), lttf2),
    Intrinsic::env("__cmptf2", TWO_WIDE, Some(I32), cmptf2),
    Intrinsic::env("__unordtf2", TWO_WIDE, Some(I32), unordtf2),
    Intrinsic::env("__floatsitf", &[I32, I32], None, floatsitf),
    Intrinsic::env("__floatditf", &[I32, I64], None, floatditf),
    Intrinsic::env("__floatunsitf", &[I32, I32], None, floatunsitf),
    Intrinsic::env("__floatunditf", &[I32, I64], None, floatunditf),
    Intrinsic::env("__floattidf", WIDE, Some(TF64), floattidf),
    Intrinsic::env("__floatuntidf", WIDE, Some(TF64), floatuntidf),
    Intrinsic::env("__floatsidf", &[I32], Some(TF64), floatsidf),
    Intrinsic::env("__extendsftf2", &[I32, TF32], None, extendsftf2),
    Intrinsic::env("__extenddftf2", &[I32, TF64], None, extenddftf2),
    Intrinsic::env("__trunctfdf2", WIDE, Some(TF64), trunctfdf2),
    Intrinsic::env("__trunctfsf2", WIDE, Some(TF32), trunctfsf2),
    Intrinsic::env("__fixtfsi", WIDE, Some(I32), fixtfsi),
    Intrinsic::env("__fixtfdi", WIDE, Some(I64), fixtfdi),
    Intrinsic::env("__fixtfti", RET_WIDE, None, fixtfti),
    Intrinsic::env("__fixunstfsi", WIDE, Some(I32), fixunstfsi),
    Intrinsic::env("__fixunstfdi", WIDE, Some(I64), fixunstfdi),
    Intrinsic::env("__fixunstfti", RET_WIDE, None, fixunstfti),
    Intrinsic::env("__fixsfti", &[I32, TF32], None, fixsfti),
    Intrinsic::env("__fixdfti", &[I32, TF64], None, fixdfti),
    Intrinsic::env("__fixunssfti", &[I32, TF32], None, fixunssfti),
    Intrinsic::env("__fixunsdfti", &[I32, TF64], None, fixunsdfti),
];

/// Charge, then store `value` through the pointer in argument 0.
fn store(
    ctx: &mut Context<'_>,
    args: &[Value],
    value: impl FnOnce(Args<'_>) -> Result<u128>,
) -> Result<Option<Value>> {
    ctx.use_gas(CALL_BASE)?;
    let a = Args(args);
    let ret = a.u32(0)?;
    let value = value(a)?;
    ctx.memory.store_u128(ret, value)?;
    Ok(None)
}

/// Charge, then return a scalar computed from the arguments.
fn scalar(
    ctx: &mut Context<'_>,
    args: &[Value],
    value: impl FnOnce(Args<'_>) -> Result<Value>,
) -> Result<Option<Value>> {
    ctx.use_gas(CALL_BASE)?;
    value(Args(args)).map(Some)
}

// ── Shifts ──────────────────────────────────────────────────────────────────

fn ashlti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::shl(a.u128(1)?, a.u32(3)?)))
}

fn ashrti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::ashr(a.u128(1)?, a.u32(3)?)))
}

fn lshlti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::shl(a.u128(1)?, a.u32(3)?)))
}

fn lshrti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::lshr(a.u128(1)?, a.u32(3)?)))
}

// ── Integer arithmetic ──────────────────────────────────────────────────────

fn divti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::div_signed(a.u128(1)?, a.u128(3)?)?))
}

fn udivti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::div_unsigned(a.u128(1)?, a.u128(3)?)?))
}

fn modti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::rem_signed(a.u128(1)?, a.u128(3)?)?))
}

fn umodti3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::rem_unsigned(a.u128(1)?, a.u128(3)?)?))
}

fn multi3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::mul(a.u128(1)?, a.u128(3)?)))
}

// ── binary128 arithmetic ────────────────────────────────────────────────────

fn addtf3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_add(a.u128(1)?, a.u128(3)?)))
}

fn subtf3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_sub(a.u128(1)?, a.u128(3)?)))
}

fn multf3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_mul(a.u128(1)?, a.u128(3)?)))
}

fn divtf3(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_div(a.u128(1)?, a.u128(3)?)))
}

fn negtf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_neg(a.u128(1)?)))
}

// ── binary128 comparisons ───────────────────────────────────────────────────
//
// -1, 0 or 1 for less, equal or greater; the last argument of `f128_cmp`
// is what an unordered pair yields.

fn compare(ctx: &mut Context<'_>, args: &[Value], unordered: i32) -> Result<Option<Value>> {
    scalar(ctx, args, |a| {
        Ok(Value::I32(wide::f128_cmp(a.u128(0)?, a.u128(2)?, unordered)))
    })
}

fn eqtf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, 1)
}

fn netf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, 1)
}

fn getf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, -1)
}

fn gttf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, 0)
}

fn letf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, 1)
}

fn lttf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, 0)
}

fn cmptf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    compare(ctx, args, 1)
}

fn unordtf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| {
        Ok(Value::I32(wide::f128_unordered(a.u128(0)?, a.u128(2)?)))
    })
}

// ── Conversions into binary128 ──────────────────────────────────────────────

fn floatsitf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_from_signed(a.i32(1)? as i64)))
}

fn floatditf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_from_signed(a.i64(1)?)))
}

fn floatunsitf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_from_unsigned(a.u32(1)? as u64)))
}

fn floatunditf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_from_unsigned(a.u64(1)?)))
}

fn extendsftf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_from_f32(a.f32(1)?)))
}

fn extenddftf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::f128_from_f64(a.f64(1)?)))
}

// ── Conversions to double and float ─────────────────────────────────────────

fn floattidf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| Ok(Value::F64(wide::f64_from_i128(a.u128(0)?))))
}

fn floatuntidf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| Ok(Value::F64(wide::f64_from_u128(a.u128(0)?))))
}

fn floatsidf(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| Ok(Value::F64(a.i32(0)? as f64)))
}

fn trunctfdf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| Ok(Value::F64(wide::f128_to_f64(a.u128(0)?))))
}

fn trunctfsf2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| Ok(Value::F32(wide::f128_to_f32(a.u128(0)?))))
}

// ── Truncation to integers ──────────────────────────────────────────────────
//
// Out-of-range inputs and NaN saturate: signed results to the minimum of
// the target width, unsigned results to the maximum.

fn fixtfsi(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| {
        Ok(Value::I32(wide::to_signed_saturating(F128, a.u128(0)?, 32) as i32))
    })
}

fn fixtfdi(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| {
        Ok(Value::I64(wide::to_signed_saturating(F128, a.u128(0)?, 64) as i64))
    })
}

fn fixtfti(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| {
        Ok(wide::to_signed_saturating(F128, a.u128(1)?, 128) as u128)
    })
}

fn fixunstfsi(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| {
        Ok(Value::I32(wide::to_unsigned_saturating(F128, a.u128(0)?, 32) as i32))
    })
}

fn fixunstfdi(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    scalar(ctx, args, |a| {
        Ok(Value::I64(wide::to_unsigned_saturating(F128, a.u128(0)?, 64) as i64))
    })
}

fn fixunstfti(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| Ok(wide::to_unsigned_saturating(F128, a.u128(1)?, 128)))
}

fn fixsfti(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| {
        let bits = a.f32(1)?.to_bits() as u128;
        Ok(wide::to_signed_saturating(F32, bits, 128) as u128)
    })
}

fn fixdfti(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| {
        let bits = a.f64(1)?.to_bits() as u128;
        Ok(wide::to_signed_saturating(F64, bits, 128) as u128)
    })
}

fn fixunssfti(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| {
        let bits = a.f32(1)?.to_bits() as u128;
        Ok(wide::to_unsigned_saturating(F32, bits, 128))
    })
}

fn fixunsdfti(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    store(ctx, args, |a| {
        let bits = a.f64(1)?.to_bits() as u128;
        Ok(wide::to_unsigned_saturating(F64, bits, 128))
    })
}
