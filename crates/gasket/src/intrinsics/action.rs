//! The running action: its payload, its parties, value transfer and
//! calls into other contracts. Also home of the injected `use_gas`.

use tracing::debug;

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::gas::{CALL_BASE, MEMOP_BYTE, TRANSFER};
use crate::host::NestedCall;
use crate::types::ValueType::{I32, I64};
use crate::types::{Address, Value};

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::injected("use_gas", &[I64], None, use_gas),
    Intrinsic::env("read_action_data", &[I32, I32], Some(I32), read_action_data),
    Intrinsic::env("action_data_size", &[], Some(I32), action_data_size),
    Intrinsic::env("get_from", &[I32, I32], None, get_from),
    Intrinsic::env("get_to", &[I32, I32], None, get_to),
    Intrinsic::env("get_owner", &[I32, I32], None, get_owner),
    Intrinsic::env("get_user", &[I32, I32], None, get_user),
    Intrinsic::env("transfer", &[I32, I32, I64], None, transfer),
    Intrinsic::env("get_amount", &[], Some(I64), get_amount),
    Intrinsic::env(
        "call_action",
        &[I32, I32, I32, I32, I64, I32, I32],
        Some(I32),
        call_action,
    ),
    Intrinsic::env("call_result", &[I32, I32], Some(I32), call_result),
    Intrinsic::env("set_result", &[I32, I32], Some(I32), set_result),
];

/// Charged by instrumented code at the end of every basic block. A
/// negative amount reads as a huge unsigned one and always fails.
fn use_gas(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    ctx.use_gas(Args(args).u64(0)?)?;
    Ok(None)
}

// (buf, buf_len): with an empty buffer, only reports the size.
fn read_action_data(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    let size = ctx.action.data.len();
    let buf_len = a.u32(1)? as usize;
    if buf_len == 0 {
        return Ok(Some(Value::I32(size as i32)));
    }
    ctx.use_gas(size as u64 * MEMOP_BYTE)?;
    let copied = buf_len.min(size);
    ctx.memory.write(a.u32(0)?, &ctx.action.data[..copied])?;
    Ok(Some(Value::I32(copied as i32)))
}

fn action_data_size(ctx: &mut Context<'_>, _: &[Value]) -> Result<Option<Value>> {
    ctx.use_gas(CALL_BASE)?;
    Ok(Some(Value::I32(ctx.action.data.len() as i32)))
}

// (buf, buf_len): copies at most 20 bytes.
fn copy_address(ctx: &mut Context<'_>, args: &[Value], address: Address) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE + Address::LEN as u64 * MEMOP_BYTE)?;
    let len = (a.u32(1)? as usize).min(Address::LEN);
    ctx.memory.write(a.u32(0)?, &address.as_bytes()[..len])?;
    Ok(None)
}

fn get_from(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let address = *ctx.from();
    copy_address(ctx, args, address)
}

fn get_to(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let address = *ctx.to();
    copy_address(ctx, args, address)
}

fn get_owner(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let address = *ctx.owner();
    copy_address(ctx, args, address)
}

fn get_user(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let address = *ctx.user();
    copy_address(ctx, args, address)
}

fn read_address(ctx: &Context<'_>, ptr: u32, len: u32) -> Result<Address> {
    if len as usize != Address::LEN {
        return Err(Error::InvalidAddress("address exception".into()));
    }
    Address::from_slice(ctx.memory.slice(ptr, len)?)
}

// (addr, addr_len, amount)
fn transfer(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(TRANSFER)?;
    let to = read_address(ctx, a.u32(0)?, a.u32(1)?)?;
    ctx.host.transfer(ctx.invocation.state_key, &to, a.u64(2)?);
    Ok(None)
}

fn get_amount(ctx: &mut Context<'_>, _: &[Value]) -> Result<Option<Value>> {
    ctx.use_gas(CALL_BASE)?;
    Ok(Some(Value::I64(ctx.amount() as i64)))
}

// (addr, addr_len, action, action_len, amount, storage_delegate, user_delegate)
fn call_action(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    let to = read_address(ctx, a.u32(0)?, a.u32(1)?)?;

    let depth = ctx.depth() + 1;
    if depth > ctx.config.max_call_depth {
        return Err(Error::runtime(format!(
            "call depth {depth} exceeds the limit of {}",
            ctx.config.max_call_depth
        )));
    }

    let call = NestedCall {
        to,
        payload: ctx.memory.slice(a.u32(2)?, a.u32(3)?)?,
        amount: a.u64(4)?,
        storage_delegate: a.i32(5)?,
        user_delegate: a.i32(6)?,
        depth,
    };
    debug!(depth, amount = call.amount, "nested call");
    let status = ctx.host.call_action(ctx.invocation.state_key, call);
    Ok(Some(Value::I32(status)))
}

fn call_result(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    let buf = ctx.memory.slice_mut(a.u32(0)?, a.u32(1)?)?;
    let len = ctx.host.call_result(ctx.invocation.state_key, buf);
    Ok(Some(Value::I32(len)))
}

fn set_result(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    let result = ctx.memory.slice(a.u32(0)?, a.u32(1)?)?;
    let status = ctx.host.set_result(ctx.invocation.state_key, result);
    Ok(Some(Value::I32(status)))
}
