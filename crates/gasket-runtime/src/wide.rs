//! 128-bit integer and binary128 helpers.
//!
//! Contracts compiled for wasm32 lower `__int128` and `long double`
//! arithmetic to compiler-builtin calls (`__multi3`, `__addtf3`, ...). The
//! host implements those builtins on top of this module. 128-bit values
//! travel as `(low, high)` 64-bit halves on the Wasm side and as `u128`
//! here.
//!
//! Float-to-integer builtins saturate instead of trapping: a signed result
//! becomes its minimum on NaN or overflow, an unsigned result becomes its
//! maximum on NaN, overflow, or a negative input.

use core::cmp::Ordering;

use crate::softfloat::{self, Format, F128, F32, F64};
use crate::{Trap, TrapResult};

/// Join two 64-bit halves into a 128-bit value.
#[inline(always)]
pub fn join(low: u64, high: u64) -> u128 {
    ((high as u128) << 64) | low as u128
}

// ── Shifts ───────────────────────────────────────────────────────────────────
//
// Shift amounts of 128 or more shift every bit out.

/// `__ashlti3` / `__lshlti3`.
pub fn shl(value: u128, shift: u32) -> u128 {
    value.checked_shl(shift).unwrap_or(0)
}

/// `__ashrti3`: arithmetic right shift.
pub fn ashr(value: u128, shift: u32) -> u128 {
    let value = value as i128;
    value.checked_shr(shift).unwrap_or(value >> 127) as u128
}

/// `__lshrti3`: logical right shift.
pub fn lshr(value: u128, shift: u32) -> u128 {
    value.checked_shr(shift).unwrap_or(0)
}

// ── Multiplication / division ────────────────────────────────────────────────

/// `__multi3`: wrapping product.
pub fn mul(a: u128, b: u128) -> u128 {
    a.wrapping_mul(b)
}

/// `__divti3`: signed quotient, wrapping on `MIN / -1`.
pub fn div_signed(a: u128, b: u128) -> TrapResult<u128> {
    if b == 0 {
        return Err(Trap::DivisionByZero);
    }
    Ok((a as i128).wrapping_div(b as i128) as u128)
}

/// `__udivti3`.
pub fn div_unsigned(a: u128, b: u128) -> TrapResult<u128> {
    a.checked_div(b).ok_or(Trap::DivisionByZero)
}

/// `__modti3`: signed remainder, zero for `MIN % -1`.
pub fn rem_signed(a: u128, b: u128) -> TrapResult<u128> {
    if b == 0 {
        return Err(Trap::DivisionByZero);
    }
    Ok((a as i128).wrapping_rem(b as i128) as u128)
}

/// `__umodti3`.
pub fn rem_unsigned(a: u128, b: u128) -> TrapResult<u128> {
    a.checked_rem(b).ok_or(Trap::DivisionByZero)
}

// ── binary128 arithmetic ─────────────────────────────────────────────────────

/// `__addtf3`.
pub fn f128_add(a: u128, b: u128) -> u128 {
    softfloat::add(F128, a, b)
}

/// `__subtf3`.
pub fn f128_sub(a: u128, b: u128) -> u128 {
    softfloat::sub(F128, a, b)
}

/// `__multf3`.
pub fn f128_mul(a: u128, b: u128) -> u128 {
    softfloat::mul(F128, a, b)
}

/// `__divtf3`.
pub fn f128_div(a: u128, b: u128) -> u128 {
    softfloat::div(F128, a, b)
}

/// `__negtf2`.
pub fn f128_neg(a: u128) -> u128 {
    softfloat::neg(F128, a)
}

// ── binary128 comparison ─────────────────────────────────────────────────────

/// Three-way comparison in the libgcc style: -1, 0 or 1 when ordered,
/// `unordered` when either operand is a NaN.
pub fn f128_cmp(a: u128, b: u128, unordered: i32) -> i32 {
    match softfloat::compare(F128, a, b) {
        None => unordered,
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) => 0,
        Some(Ordering::Greater) => 1,
    }
}

/// `__unordtf2`: 1 when either operand is a NaN.
pub fn f128_unordered(a: u128, b: u128) -> i32 {
    (F128.is_nan(a) || F128.is_nan(b)) as i32
}

// ── Conversions into binary128 ───────────────────────────────────────────────

/// `__floatsitf` / `__floatditf`.
pub fn f128_from_signed(v: i64) -> u128 {
    softfloat::from_i128(F128, v as i128)
}

/// `__floatunsitf` / `__floatunditf`.
pub fn f128_from_unsigned(v: u64) -> u128 {
    softfloat::from_int(F128, false, v as u128)
}

/// `__extendsftf2`.
pub fn f128_from_f32(v: f32) -> u128 {
    softfloat::convert(F32, F128, v.to_bits() as u128)
}

/// `__extenddftf2`.
pub fn f128_from_f64(v: f64) -> u128 {
    softfloat::convert(F64, F128, v.to_bits() as u128)
}

// ── Conversions out of binary128 ─────────────────────────────────────────────

/// `__trunctfdf2`.
pub fn f128_to_f64(a: u128) -> f64 {
    f64::from_bits(softfloat::convert(F128, F64, a) as u64)
}

/// `__trunctfsf2`.
pub fn f128_to_f32(a: u128) -> f32 {
    f32::from_bits(softfloat::convert(F128, F32, a) as u32)
}

/// Truncate to a signed integer of `width` bits, saturating to its minimum.
pub fn to_signed_saturating(fmt: Format, a: u128, width: u32) -> i128 {
    softfloat::trunc_to_signed(fmt, a, width).unwrap_or(i128::MIN >> (128 - width))
}

/// Truncate to an unsigned integer of `width` bits, saturating to its maximum.
pub fn to_unsigned_saturating(fmt: Format, a: u128, width: u32) -> u128 {
    softfloat::trunc_to_unsigned(fmt, a, width).unwrap_or(u128::MAX >> (128 - width))
}

// ── Integer → double ─────────────────────────────────────────────────────────

/// `__floattidf`.
pub fn f64_from_i128(v: u128) -> f64 {
    f64::from_bits(softfloat::from_i128(F64, v as i128) as u64)
}

/// `__floatuntidf`.
pub fn f64_from_u128(v: u128) -> f64 {
    f64::from_bits(softfloat::from_int(F64, false, v) as u64)
}
