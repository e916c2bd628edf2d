//! Software replacements for every wasm float instruction.
//!
//! The float pass rewrites each float opcode into a call to one of these,
//! so results never depend on the host FPU. They live in the injected
//! namespace and are free: the instruction they replace was already
//! charged by the gas pass.

use gasket_runtime::ops;

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::Result;
use crate::types::ValueType::{F32, F64, I32, I64};
use crate::types::{Value, ValueType};

const F32_UNARY: &[ValueType] = &[F32];
const F32_BINARY: &[ValueType] = &[F32, F32];
const F64_UNARY: &[ValueType] = &[F64];
const F64_BINARY: &[ValueType] = &[F64, F64];

/// Declares one handler per operator, binding its arguments by type.
macro_rules! handlers {
    ($($name:ident($($arg:ident: $ty:ident @ $i:literal),*) -> $wrap:expr => $body:expr;)*) => {
        $(
            fn $name(_: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
                let a = Args(args);
                $(let $arg = a.$ty($i)?;)*
                let wrap = $wrap;
                Ok(Some(wrap($body)))
            }
        )*
    };
}

fn flag(v: bool) -> Value {
    Value::I32(v as i32)
}

handlers! {
    f32_add(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_add(x, y);
    f32_sub(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_sub(x, y);
    f32_mul(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_mul(x, y);
    f32_div(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_div(x, y);
    f32_min(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_min(x, y);
    f32_max(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_max(x, y);
    f32_copysign(x: f32 @ 0, y: f32 @ 1) -> Value::F32 => ops::f32_copysign(x, y);
    f32_abs(x: f32 @ 0) -> Value::F32 => ops::f32_abs(x);
    f32_neg(x: f32 @ 0) -> Value::F32 => ops::f32_neg(x);
    f32_sqrt(x: f32 @ 0) -> Value::F32 => ops::f32_sqrt(x);
    f32_ceil(x: f32 @ 0) -> Value::F32 => ops::f32_ceil(x);
    f32_floor(x: f32 @ 0) -> Value::F32 => ops::f32_floor(x);
    f32_trunc(x: f32 @ 0) -> Value::F32 => ops::f32_trunc(x);
    f32_nearest(x: f32 @ 0) -> Value::F32 => ops::f32_nearest(x);

    f64_add(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_add(x, y);
    f64_sub(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_sub(x, y);
    f64_mul(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_mul(x, y);
    f64_div(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_div(x, y);
    f64_min(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_min(x, y);
    f64_max(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_max(x, y);
    f64_copysign(x: f64 @ 0, y: f64 @ 1) -> Value::F64 => ops::f64_copysign(x, y);
    f64_abs(x: f64 @ 0) -> Value::F64 => ops::f64_abs(x);
    f64_neg(x: f64 @ 0) -> Value::F64 => ops::f64_neg(x);
    f64_sqrt(x: f64 @ 0) -> Value::F64 => ops::f64_sqrt(x);
    f64_ceil(x: f64 @ 0) -> Value::F64 => ops::f64_ceil(x);
    f64_floor(x: f64 @ 0) -> Value::F64 => ops::f64_floor(x);
    f64_trunc(x: f64 @ 0) -> Value::F64 => ops::f64_trunc(x);
    f64_nearest(x: f64 @ 0) -> Value::F64 => ops::f64_nearest(x);

    f32_eq(x: f32 @ 0, y: f32 @ 1) -> flag => ops::f32_eq(x, y);
    f32_ne(x: f32 @ 0, y: f32 @ 1) -> flag => ops::f32_ne(x, y);
    f32_lt(x: f32 @ 0, y: f32 @ 1) -> flag => ops::f32_lt(x, y);
    f32_gt(x: f32 @ 0, y: f32 @ 1) -> flag => ops::f32_gt(x, y);
    f32_le(x: f32 @ 0, y: f32 @ 1) -> flag => ops::f32_le(x, y);
    f32_ge(x: f32 @ 0, y: f32 @ 1) -> flag => ops::f32_ge(x, y);
    f64_eq(x: f64 @ 0, y: f64 @ 1) -> flag => ops::f64_eq(x, y);
    f64_ne(x: f64 @ 0, y: f64 @ 1) -> flag => ops::f64_ne(x, y);
    f64_lt(x: f64 @ 0, y: f64 @ 1) -> flag => ops::f64_lt(x, y);
    f64_gt(x: f64 @ 0, y: f64 @ 1) -> flag => ops::f64_gt(x, y);
    f64_le(x: f64 @ 0, y: f64 @ 1) -> flag => ops::f64_le(x, y);
    f64_ge(x: f64 @ 0, y: f64 @ 1) -> flag => ops::f64_ge(x, y);

    f32_promote(x: f32 @ 0) -> Value::F64 => ops::f64_promote_f32(x);
    f64_demote(x: f64 @ 0) -> Value::F32 => ops::f32_demote_f64(x);

    f32_trunc_i32s(x: f32 @ 0) -> Value::I32 => ops::i32_trunc_f32_s(x)?;
    f32_trunc_i32u(x: f32 @ 0) -> Value::I32 => ops::i32_trunc_f32_u(x)?;
    f64_trunc_i32s(x: f64 @ 0) -> Value::I32 => ops::i32_trunc_f64_s(x)?;
    f64_trunc_i32u(x: f64 @ 0) -> Value::I32 => ops::i32_trunc_f64_u(x)?;
    f32_trunc_i64s(x: f32 @ 0) -> Value::I64 => ops::i64_trunc_f32_s(x)?;
    f32_trunc_i64u(x: f32 @ 0) -> Value::I64 => ops::i64_trunc_f32_u(x)?;
    f64_trunc_i64s(x: f64 @ 0) -> Value::I64 => ops::i64_trunc_f64_s(x)?;
    f64_trunc_i64u(x: f64 @ 0) -> Value::I64 => ops::i64_trunc_f64_u(x)?;

    i32_to_f32(x: i32 @ 0) -> Value::F32 => ops::f32_convert_i32_s(x);
    ui32_to_f32(x: i32 @ 0) -> Value::F32 => ops::f32_convert_i32_u(x);
    i64_to_f32(x: i64 @ 0) -> Value::F32 => ops::f32_convert_i64_s(x);
    ui64_to_f32(x: i64 @ 0) -> Value::F32 => ops::f32_convert_i64_u(x);
    i32_to_f64(x: i32 @ 0) -> Value::F64 => ops::f64_convert_i32_s(x);
    ui32_to_f64(x: i32 @ 0) -> Value::F64 => ops::f64_convert_i32_u(x);
    i64_to_f64(x: i64 @ 0) -> Value::F64 => ops::f64_convert_i64_s(x);
    ui64_to_f64(x: i64 @ 0) -> Value::F64 => ops::f64_convert_i64_u(x);
}

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::injected("_eosio_f32_add", F32_BINARY, Some(F32), f32_add),
    Intrinsic::injected("_eosio_f32_sub", F32_BINARY, Some(F32), f32_sub),
    Intrinsic::injected("_eosio_f32_mul", F32_BINARY, Some(F32), f32_mul),
    Intrinsic::injected("_eosio_f32_div", F32_BINARY, Some(F32), f32_div),
    Intrinsic::injected("_eosio_f32_min", F32_BINARY, Some(F32), f32_min),
    Intrinsic::injected("_eosio_f32_max", F32_BINARY, Some(F32), f32_max),
    Intrinsic::injected("_eosio_f32_copysign", F32_BINARY, Some(F32), f32_copysign),
    Intrinsic::injected("_eosio_f32_abs", F32_UNARY, Some(F32), f32_abs),
    Intrinsic::injected("_eosio_f32_neg", F32_UNARY, Some(F32), f32_neg),
    Intrinsic::injected("_eosio_f32_sqrt", F32_UNARY, Some(F32), f32_sqrt),
    Intrinsic::injected("_eosio_f32_ceil", F32_UNARY, Some(F32), f32_ceil),
    Intrinsic::injected("_eosio_f32_floor", F32_UNARY, Some(F32), f32_floor),
    Intrinsic::injected("_eosio_f32_trunc", F32_UNARY, Some(F32), f32_trunc),
    Intrinsic::injected("_eosio_f32_nearest", F32_UNARY, Some(F32), f32_nearest),
    Intrinsic::injected("_eosio_f64_add", F64_BINARY, Some(F64), f64_add),
    Intrinsic::injected("_eosio_f64_sub", F64_BINARY, Some(F64), f64_sub),
    Intrinsic::injected("_eosio_f64_mul", F64_BINARY, Some(F64), f64_mul),
    Intrinsic::injected("_eosio_f64_div", F64_BINARY, Some(F64), f64_div),
    Intrinsic::injected("_eosio_f64_min", F64_BINARY, Some(F64), f64_min),
    Intrinsic::injected("_eosio_f64_max", F64_BINARY, Some(F64), f64_max),
    Intrinsic::injected("_eosio_f64_copysign", F64_BINARY, Some(F64), f64_copysign),
    Intrinsic::injected("_eosio_f64_abs", F64_UNARY, Some(F64), f64_abs),
    Intrinsic::injected("_eosio_f64_neg", F64_UNARY, Some(F64), f64_neg),
    Intrinsic::injected("_eosio_f64_sqrt", F64_UNARY, Some(F64), f64_sqrt),
    Intrinsic::injected("_eosio_f64_ceil", F64_UNARY, Some(F64), f64_ceil),
    Intrinsic::injected("_eosio_f64_floor", F64_UNARY, Some(F64), f64_floor),
    Intrinsic::injected("_eosio_f64_trunc", F64_UNARY, Some(F64), f64_trunc),
    Intrinsic::injected("_eosio_f64_nearest", F64_UNARY, Some(F64), f64_nearest),
    Intrinsic::injected("_eosio_f32_eq", F32_BINARY, Some(I32), f32_eq),
    Intrinsic::injected("_eosio_f32_ne", F32_BINARY, Some(I32), f32_ne),
    Intrinsic::injected("_eosio_f32_lt", F32_BINARY, Some(I32), f32_lt),
    Intrinsic::injected("_eosio_f32_gt", F32_BINARY, Some(I32), f32_gt),
    Intrinsic::injected("_eosio_f32_le", F32_BINARY, Some(I32), f32_le),
    Intrinsic::injected("_eosio_f32_ge", F32_BINARY, Some(I32), f32_ge),
    Intrinsic::injected("_eosio_f64_eq", F64_BINARY, Some(I32), f64_eq),
    Intrinsic::injected("_eosio_f64_ne", F64_BINARY, Some(I32), f64_ne),
    Intrinsic::injected("_eosio_f64_lt", F64_BINARY, Some(I32), f64_lt),
    Intrinsic::injected("_eosio_f64_gt", F64_BINARY, Some(I32), f64_gt),
    Intrinsic::injected("_eosio_f64_le", F64_BINARY, Some(I32), f64_le),
    Intrinsic::injected("_eosio_f64_ge", F64_BINARY, Some(I32), f64_ge),
    Intrinsic::injected("_eosio_f32_promote", F32_UNARY, Some(F64), f32_promote),
    Intrinsic::injected("_eosio_f64_demote", F64_UNARY, Some(F32), f64_demote),
    Intrinsic::injected("_eosio_f32_trunc_i32s", F32_UNARY, Some(I32), f32_trunc_i32s),
    Intrinsic::injected("_eosio_f32_trunc_i32u", F32_UNARY, Some(I32), f32_trunc_i32u),
    Intrinsic::injected("_eosio_f64_trunc_i32s", F64_UNARY, Some(I32), f64_trunc_i32s),
    Intrinsic::injected("_eosio_f64_trunc_i32u", F64_UNARY, Some(I32), f64_trunc_i32u),
    Intrinsic::injected("_eosio_f32_trunc_i64s", F32_UNARY, Some(I64), f32_trunc_i64s),
    Intrinsic::injected("_eosio_f32_trunc_i64u", F32_UNARY, Some(I64), f32_trunc_i64u),
    Intrinsic::injected("_eosio_f64_trunc_i64s", F64_UNARY, Some(I64), f64_trunc_i64s),
    Intrinsic::injected("_eosio_f64_trunc_i64u", F64_UNARY, Some(I64), f64_trunc_i64u),
    Intrinsic::injected("_eosio_i32_to_f32", &[I32], Some(F32), i32_to_f32),
    Intrinsic::injected("_eosio_ui32_to_f32", &[I32], Some(F32), ui32_to_f32),
    Intrinsic::injected("_eosio_i64_to_f32", &[I64], Some(F32), i64_to_f32),
    Intrinsic::injected("_eosio_ui64_to_f32", &[I64], Some(F32), ui64_to_f32),
    Intrinsic::injected("_eosio_i32_to_f64", &[I32], Some(F64), i32_to_f64),
    Intrinsic::injected("_eosio_ui32_to_f64", &[I32], Some(F64), ui32_to_f64),
    Intrinsic::injected("_eosio_i64_to_f64", &[I64], Some(F64), i64_to_f64),
    Intrinsic::injected("_eosio_ui64_to_f64", &[I64], Some(F64), ui64_to_f64),
];
