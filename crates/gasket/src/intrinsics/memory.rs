//! libc-style memory routines over linear memory.

use std::cmp::Ordering;

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::gas::{CALL_BASE, MEMOP_BYTE};
use crate::types::Value;
use crate::types::ValueType::I32;

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("memcpy", &[I32, I32, I32], Some(I32), memcpy),
    Intrinsic::env("memmove", &[I32, I32, I32], Some(I32), memmove),
    Intrinsic::env("memcmp", &[I32, I32, I32], Some(I32), memcmp),
    Intrinsic::env("memset", &[I32, I32, I32], Some(I32), memset),
];

/// Decode `(dest, src_or_value, len)` and charge for `len` bytes.
fn charged(ctx: &mut Context<'_>, args: &[Value]) -> Result<(u32, u32, u32)> {
    let a = Args(args);
    let (dest, src, len) = (a.u32(0)?, a.u32(1)?, a.u32(2)?);
    ctx.use_gas(CALL_BASE + MEMOP_BYTE * len as u64)?;
    Ok((dest, src, len))
}

fn memcpy(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let (dest, src, len) = charged(ctx, args)?;
    if dest.abs_diff(src) < len {
        return Err(Error::OverlappingMemory(
            "memcpy can only accept non-aliasing pointers".into(),
        ));
    }
    ctx.memory.copy_within(dest, src, len)?;
    Ok(Some(Value::I32(dest as i32)))
}

fn memmove(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let (dest, src, len) = charged(ctx, args)?;
    ctx.memory.copy_within(dest, src, len)?;
    Ok(Some(Value::I32(dest as i32)))
}

fn memcmp(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let (a, b, len) = charged(ctx, args)?;
    let ordering = ctx.memory.slice(a, len)?.cmp(ctx.memory.slice(b, len)?);
    Ok(Some(Value::I32(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })))
}

fn memset(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let (dest, value, len) = charged(ctx, args)?;
    ctx.memory.fill(dest, value as u8, len)?;
    Ok(Some(Value::I32(dest as i32)))
}
