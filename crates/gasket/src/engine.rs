//! The seam to the virtual machine that actually runs instrumented code.
//!
//! The sandbox never interprets or compiles bytecode itself. An [`Engine`]
//! turns an instrumented module plus its resolved imports into an
//! [`Instance`]; the instance calls back into [`Intrinsic::call`] whenever
//! the module invokes an import.

use crate::context::Context;
use crate::error::Result;
use crate::intrinsics::Intrinsic;
use crate::types::Value;

pub trait Engine: Send + Sync {
    /// Compile and instantiate `wasm`. `imports[i]` backs function import
    /// `i`; injected imports come first.
    fn instantiate(&self, wasm: &[u8], imports: Vec<&'static Intrinsic>) -> Result<Box<dyn Instance>>;
}

/// A compiled module, shared by every invocation of the same code.
pub trait Instance: Send + Sync {
    /// Invoke an exported function.
    ///
    /// Linear memory lives in the context and has already been reset. The
    /// instance must start from freshly initialized globals and run the
    /// start function, if any, before the export. Traps map to
    /// [`crate::Error::Runtime`]; errors returned by intrinsics propagate
    /// unchanged.
    fn invoke(&self, ctx: &mut Context<'_>, export: &str, args: &[Value]) -> Result<Option<Value>>;
}
