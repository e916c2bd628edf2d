//! Contract storage: byte keys inside numbered tables.

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::Result;
use crate::gas::{DBLOAD_BASE, DBLOAD_BYTE, DBSTORE_BASE, DBSTORE_BYTE, DB_HAS, DB_RMV};
use crate::types::Value;
use crate::types::ValueType::{I32, I64};

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("db_store", &[I64, I32, I32, I32, I32], None, db_store),
    Intrinsic::env("db_load", &[I64, I32, I32, I32, I32], Some(I32), db_load),
    Intrinsic::env("db_has_key", &[I64, I32, I32], Some(I32), db_has_key),
    Intrinsic::env("db_remove_key", &[I64, I32, I32], None, db_remove_key),
    Intrinsic::env("db_has_table", &[I64], Some(I32), db_has_table),
    Intrinsic::env("db_remove_table", &[I64], None, db_remove_table),
];

// (table, key, key_len, value, value_len)
fn db_store(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    let (table, key, key_len, value, value_len) = (a.u64(0)?, a.u32(1)?, a.u32(2)?, a.u32(3)?, a.u32(4)?);
    ctx.use_gas(DBSTORE_BASE + value_len as u64 * DBSTORE_BYTE)?;
    let k = ctx.memory.slice(key, key_len)?;
    let v = ctx.memory.slice(value, value_len)?;
    ctx.host.db_store(ctx.invocation.state_key, table, k, v);
    Ok(None)
}

// (table, key, key_len, buf, buf_len) -> value length
fn db_load(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    let (table, key, key_len, buf, buf_len) = (a.u64(0)?, a.u32(1)?, a.u32(2)?, a.u32(3)?, a.u32(4)?);
    ctx.use_gas(DBLOAD_BASE + buf_len as u64 * DBLOAD_BYTE)?;
    let k = ctx.memory.slice(key, key_len)?.to_vec();
    let out = ctx.memory.slice_mut(buf, buf_len)?;
    let len = ctx.host.db_load(ctx.invocation.state_key, table, &k, out);
    Ok(Some(Value::I32(len)))
}

fn db_has_key(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(DB_HAS)?;
    let k = ctx.memory.slice(a.u32(1)?, a.u32(2)?)?;
    let found = ctx.host.db_has_key(ctx.invocation.state_key, a.u64(0)?, k);
    Ok(Some(Value::I32(found as i32)))
}

fn db_remove_key(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(DB_RMV)?;
    let k = ctx.memory.slice(a.u32(1)?, a.u32(2)?)?;
    ctx.host.db_remove_key(ctx.invocation.state_key, a.u64(0)?, k);
    Ok(None)
}

fn db_has_table(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let table = Args(args).u64(0)?;
    ctx.use_gas(DB_HAS)?;
    let found = ctx.host.db_has_table(ctx.invocation.state_key, table);
    Ok(Some(Value::I32(found as i32)))
}

fn db_remove_table(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let table = Args(args).u64(0)?;
    ctx.use_gas(DB_RMV)?;
    ctx.host.db_remove_table(ctx.invocation.state_key, table);
    Ok(None)
}
