//! Wasm floating-point operators, evaluated without the host FPU.
//!
//! The instrumenter replaces every float instruction in a contract with a
//! call to a host import; those imports land here. Values cross the
//! boundary as native `f32`/`f64`, but only their bit patterns are used:
//! all arithmetic goes through [`crate::softfloat`].
//!
//! ## Float-to-integer truncation
//!
//! Wasm requires a **trap** for NaN or out-of-range input. The range check
//! is applied to the truncated magnitude, so `-0.5` is a valid unsigned
//! input and `-2147483648.9` is a valid `i32` input.
//!
//! `no_std` compatible: no alloc, no std, no panics.

use crate::softfloat::{self, RoundMode, F32, F64};
use crate::{Trap, TrapResult};

#[inline(always)]
fn w32(v: f32) -> u128 {
    v.to_bits() as u128
}

#[inline(always)]
fn w64(v: f64) -> u128 {
    v.to_bits() as u128
}

#[inline(always)]
fn n32(bits: u128) -> f32 {
    f32::from_bits(bits as u32)
}

#[inline(always)]
fn n64(bits: u128) -> f64 {
    f64::from_bits(bits as u64)
}

// ── f32 arithmetic ───────────────────────────────────────────────────────────

pub fn f32_add(a: f32, b: f32) -> f32 {
    n32(softfloat::add(F32, w32(a), w32(b)))
}

pub fn f32_sub(a: f32, b: f32) -> f32 {
    n32(softfloat::sub(F32, w32(a), w32(b)))
}

pub fn f32_mul(a: f32, b: f32) -> f32 {
    n32(softfloat::mul(F32, w32(a), w32(b)))
}

pub fn f32_div(a: f32, b: f32) -> f32 {
    n32(softfloat::div(F32, w32(a), w32(b)))
}

pub fn f32_sqrt(a: f32) -> f32 {
    n32(softfloat::sqrt(F32, w32(a)))
}

pub fn f32_min(a: f32, b: f32) -> f32 {
    n32(softfloat::min(F32, w32(a), w32(b)))
}

pub fn f32_max(a: f32, b: f32) -> f32 {
    n32(softfloat::max(F32, w32(a), w32(b)))
}

pub fn f32_abs(a: f32) -> f32 {
    n32(softfloat::abs(F32, w32(a)))
}

pub fn f32_neg(a: f32) -> f32 {
    n32(softfloat::neg(F32, w32(a)))
}

pub fn f32_copysign(a: f32, b: f32) -> f32 {
    n32(softfloat::copysign(F32, w32(a), w32(b)))
}

pub fn f32_ceil(a: f32) -> f32 {
    n32(softfloat::round_to_integral(F32, w32(a), RoundMode::Ceil))
}

pub fn f32_floor(a: f32) -> f32 {
    n32(softfloat::round_to_integral(F32, w32(a), RoundMode::Floor))
}

pub fn f32_trunc(a: f32) -> f32 {
    n32(softfloat::round_to_integral(F32, w32(a), RoundMode::Trunc))
}

pub fn f32_nearest(a: f32) -> f32 {
    n32(softfloat::round_to_integral(F32, w32(a), RoundMode::Nearest))
}

// ── f64 arithmetic ───────────────────────────────────────────────────────────

pub fn f64_add(a: f64, b: f64) -> f64 {
    n64(softfloat::add(F64, w64(a), w64(b)))
}

pub fn f64_sub(a: f64, b: f64) -> f64 {
    n64(softfloat::sub(F64, w64(a), w64(b)))
}

pub fn f64_mul(a: f64, b: f64) -> f64 {
    n64(softfloat::mul(F64, w64(a), w64(b)))
}

pub fn f64_div(a: f64, b: f64) -> f64 {
    n64(softfloat::div(F64, w64(a), w64(b)))
}

pub fn f64_sqrt(a: f64) -> f64 {
    n64(softfloat::sqrt(F64, w64(a)))
}

pub fn f64_min(a: f64, b: f64) -> f64 {
    n64(softfloat::min(F64, w64(a), w64(b)))
}

pub fn f64_max(a: f64, b: f64) -> f64 {
    n64(softfloat::max(F64, w64(a), w64(b)))
}

pub fn f64_abs(a: f64) -> f64 {
    n64(softfloat::abs(F64, w64(a)))
}

pub fn f64_neg(a: f64) -> f64 {
    n64(softfloat::neg(F64, w64(a)))
}

pub fn f64_copysign(a: f64, b: f64) -> f64 {
    n64(softfloat::copysign(F64, w64(a), w64(b)))
}

pub fn f64_ceil(a: f64) -> f64 {
    n64(softfloat::round_to_integral(F64, w64(a), RoundMode::Ceil))
}

pub fn f64_floor(a: f64) -> f64 {
    n64(softfloat::round_to_integral(F64, w64(a), RoundMode::Floor))
}

pub fn f64_trunc(a: f64) -> f64 {
    n64(softfloat::round_to_integral(F64, w64(a), RoundMode::Trunc))
}

pub fn f64_nearest(a: f64) -> f64 {
    n64(softfloat::round_to_integral(F64, w64(a), RoundMode::Nearest))
}

// ── Comparisons ──────────────────────────────────────────────────────────────
//
// Every comparison involving a NaN is false, except `ne`.

pub fn f32_eq(a: f32, b: f32) -> bool {
    softfloat::eq(F32, w32(a), w32(b))
}

pub fn f32_ne(a: f32, b: f32) -> bool {
    !f32_eq(a, b)
}

pub fn f32_lt(a: f32, b: f32) -> bool {
    softfloat::lt(F32, w32(a), w32(b))
}

pub fn f32_gt(a: f32, b: f32) -> bool {
    softfloat::lt(F32, w32(b), w32(a))
}

pub fn f32_le(a: f32, b: f32) -> bool {
    softfloat::le(F32, w32(a), w32(b))
}

pub fn f32_ge(a: f32, b: f32) -> bool {
    softfloat::le(F32, w32(b), w32(a))
}

pub fn f64_eq(a: f64, b: f64) -> bool {
    softfloat::eq(F64, w64(a), w64(b))
}

pub fn f64_ne(a: f64, b: f64) -> bool {
    !f64_eq(a, b)
}

pub fn f64_lt(a: f64, b: f64) -> bool {
    softfloat::lt(F64, w64(a), w64(b))
}

pub fn f64_gt(a: f64, b: f64) -> bool {
    softfloat::lt(F64, w64(b), w64(a))
}

pub fn f64_le(a: f64, b: f64) -> bool {
    softfloat::le(F64, w64(a), w64(b))
}

pub fn f64_ge(a: f64, b: f64) -> bool {
    softfloat::le(F64, w64(b), w64(a))
}

// ── Width conversions ────────────────────────────────────────────────────────

/// Wasm `f64.promote_f32`.
pub fn f64_promote_f32(a: f32) -> f64 {
    n64(softfloat::convert(F32, F64, w32(a)))
}

/// Wasm `f32.demote_f64`.
pub fn f32_demote_f64(a: f64) -> f32 {
    n32(softfloat::convert(F64, F32, w64(a)))
}

// ── Float → integer trapping truncation ──────────────────────────────────────

/// Wasm `i32.trunc_f32_s`.
#[inline(never)]
pub fn i32_trunc_f32_s(v: f32) -> TrapResult<i32> {
    softfloat::trunc_to_signed(F32, w32(v), 32)
        .map(|x| x as i32)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i32.trunc_f32_u`, returned as the i32 bit pattern.
#[inline(never)]
pub fn i32_trunc_f32_u(v: f32) -> TrapResult<i32> {
    softfloat::trunc_to_unsigned(F32, w32(v), 32)
        .map(|x| x as u32 as i32)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i32.trunc_f64_s`.
#[inline(never)]
pub fn i32_trunc_f64_s(v: f64) -> TrapResult<i32> {
    softfloat::trunc_to_signed(F64, w64(v), 32)
        .map(|x| x as i32)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i32.trunc_f64_u`, returned as the i32 bit pattern.
#[inline(never)]
pub fn i32_trunc_f64_u(v: f64) -> TrapResult<i32> {
    softfloat::trunc_to_unsigned(F64, w64(v), 32)
        .map(|x| x as u32 as i32)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i64.trunc_f32_s`.
#[inline(never)]
pub fn i64_trunc_f32_s(v: f32) -> TrapResult<i64> {
    softfloat::trunc_to_signed(F32, w32(v), 64)
        .map(|x| x as i64)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i64.trunc_f32_u`, returned as the i64 bit pattern.
#[inline(never)]
pub fn i64_trunc_f32_u(v: f32) -> TrapResult<i64> {
    softfloat::trunc_to_unsigned(F32, w32(v), 64)
        .map(|x| x as u64 as i64)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i64.trunc_f64_s`.
#[inline(never)]
pub fn i64_trunc_f64_s(v: f64) -> TrapResult<i64> {
    softfloat::trunc_to_signed(F64, w64(v), 64)
        .map(|x| x as i64)
        .ok_or(Trap::IntegerOverflow)
}

/// Wasm `i64.trunc_f64_u`, returned as the i64 bit pattern.
#[inline(never)]
pub fn i64_trunc_f64_u(v: f64) -> TrapResult<i64> {
    softfloat::trunc_to_unsigned(F64, w64(v), 64)
        .map(|x| x as u64 as i64)
        .ok_or(Trap::IntegerOverflow)
}

// ── Integer → float conversion ───────────────────────────────────────────────

pub fn f32_convert_i32_s(v: i32) -> f32 {
    n32(softfloat::from_i128(F32, v as i128))
}

pub fn f32_convert_i32_u(v: i32) -> f32 {
    n32(softfloat::from_i128(F32, v as u32 as i128))
}

pub fn f32_convert_i64_s(v: i64) -> f32 {
    n32(softfloat::from_i128(F32, v as i128))
}

pub fn f32_convert_i64_u(v: i64) -> f32 {
    n32(softfloat::from_i128(F32, v as u64 as i128))
}

pub fn f64_convert_i32_s(v: i32) -> f64 {
    n64(softfloat::from_i128(F64, v as i128))
}

pub fn f64_convert_i32_u(v: i32) -> f64 {
    n64(softfloat::from_i128(F64, v as u32 as i128))
}

pub fn f64_convert_i64_s(v: i64) -> f64 {
    n64(softfloat::from_i128(F64, v as i128))
}

pub fn f64_convert_i64_u(v: i64) -> f64 {
    n64(softfloat::from_i128(F64, v as u64 as i128))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
