//! Assertions and early exit.

use super::{Args, Intrinsic};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::gas::CALL_BASE;
use crate::types::Value;
use crate::types::ValueType::{I32, I64};

pub(super) const INTRINSICS: &[Intrinsic] = &[
    Intrinsic::env("abort", &[], None, abort),
    Intrinsic::env("ftl_assert", &[I32, I32], None, ftl_assert),
    Intrinsic::env("ftl_assert_message", &[I32, I32, I32], None, ftl_assert_message),
    Intrinsic::env("ftl_assert_code", &[I32, I64], None, ftl_assert_code),
    Intrinsic::env("ftl_exit", &[I32], None, ftl_exit),
];

fn abort(_: &mut Context<'_>, _: &[Value]) -> Result<Option<Value>> {
    Err(Error::runtime("abort() called"))
}

fn assertion_failed(message: &[u8]) -> Error {
    Error::runtime(format!(
        "assertion failure with message: {}",
        String::from_utf8_lossy(message)
    ))
}

// (condition, c_str)
fn ftl_assert(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    if a.i32(0)? == 0 {
        let message = ctx.memory.c_str(a.u32(1)?, ctx.config.max_assert_message)?;
        return Err(assertion_failed(message));
    }
    Ok(None)
}

// (condition, msg, msg_len)
fn ftl_assert_message(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    if a.i32(0)? == 0 {
        let len = a.u32(2)?.min(ctx.config.max_assert_message as u32);
        let message = ctx.memory.slice(a.u32(1)?, len)?;
        return Err(assertion_failed(message));
    }
    Ok(None)
}

// (condition, code)
fn ftl_assert_code(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let a = Args(args);
    ctx.use_gas(CALL_BASE)?;
    if a.i32(0)? == 0 {
        return Err(Error::runtime(format!(
            "assertion failure with error code: {}",
            a.u64(1)?
        )));
    }
    Ok(None)
}

/// Stops the module. The call boundary treats this as a normal return.
fn ftl_exit(ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
    let code = Args(args).i32(0)?;
    ctx.use_gas(CALL_BASE)?;
    Err(Error::Exit(code))
}
