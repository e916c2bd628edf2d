//! Chain state queries and log emission.

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::Result;
use crate::gas::{CALL_BASE, LOG_0, LOG_1, LOG_2, LOG_DATA};
use crate::types::ValueType::{I32, I64};
use crate::types::{Digest, Value};

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("current_time", &[], Some(I64), current_time),
    Intrinsic::env("current_height", &[], Some(I64), current_height),
    Intrinsic::env("current_hash", &[I32, I32], None, current_hash),
    Intrinsic::env("log_0", &[I32, I32, I32], None, log_0),
    Intrinsic::env("log_1", &[I32, I32, I32, I32], None, log_1),
    Intrinsic::env("log_2", &[I32, I32, I32, I32, I32], None, log_2),
];

fn current_time(ctx: &mut Context<'_>, _: &[Value]) -> Result<Option<Value>> {
    ctx.use_gas(CALL_BASE)?;
    let time = ctx.host.current_time(ctx.invocation.state_key);
    Ok(Some(Value::I64(time as i64)))
}

fn current_height(ctx: &mut Context<'_>, _: &[Value]) -> Result<Option<Value>> {
    ctx.use_gas(CALL_BASE)?;
    let height = ctx.host.current_height(ctx.invocation.state_key);
    Ok(Some(Value::I64(height as i64)))
}

// (simple_hash, full_hash)
fn current_hash(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    let (simple, full) = ctx.host.current_hash(ctx.invocation.state_key);
    ctx.memory.write(a.u32(0)?, simple.as_bytes())?;
    ctx.memory.write(a.u32(1)?, full.as_bytes())?;
    Ok(None)
}

// (data, len, topic...): one 32-byte digest per topic pointer.
fn emit(ctx: &mut Context<'_>, args: &[Value], base: u64) -> Result<Option<Value>> {
    let a = Args(args);
    let len = a.u32(1)?;
    ctx.use_gas(base + len as u64 * LOG_DATA)?;
    let topics = (2..args.len())
        .map(|i| Ok(Digest(ctx.memory.read_array::<32>(a.u32(i)?)?)))
        .collect::<Result<Vec<_>>>()?;
    let data = ctx.memory.slice(a.u32(0)?, len)?;
    ctx.host.add_log(ctx.invocation.state_key, &topics, data);
    Ok(None)
}

fn log_0(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    emit(ctx, args, LOG_0)
}

fn log_1(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    emit(ctx, args, LOG_1)
}

fn log_2(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    emit(ctx, args, LOG_2)
}
