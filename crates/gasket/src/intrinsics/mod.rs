//! Host intrinsics: the functions a module may import.
//!
//! Contracts import from [`ENV_NAMESPACE`]. The instrumentation passes
//! import from [`INJECTED_NAMESPACE`], which the validating resolver
//! refuses, so a contract cannot call `use_gas` or the software-float
//! helpers directly.
//!
//! Every intrinsic that charges gas does so before touching memory or the
//! host.

mod action;
mod builtins;
mod console;
mod context_free;
mod crypto;
mod database;
mod memory;
mod softfloat;
mod system;

use std::fmt;

use tracing::trace;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::injector::INJECTED_NAMESPACE;
use crate::module::{ImportKind, Module};
use crate::types::{FuncSig, Value, ValueType};

pub use console::scientific;

/// Namespace contracts import intrinsics from.
pub const ENV_NAMESPACE: &str = "env";

pub type Handler = fn(&mut Context<'_>, &[Value]) -> Result<Option<Value>>;

/// A host function with a fixed wasm signature.
#[derive(Clone, Copy)]
pub struct Intrinsic {
    pub module: &'static str,
    pub name: &'static str,
    pub params: &'static [ValueType],
    pub result: Option<ValueType>,
    handler: Handler,
}

impl fmt::Debug for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.module, self.name, self.sig())
    }
}

impl Intrinsic {
    pub(crate) const fn env(
        name: &'static str,
        params: &'static [ValueType],
        result: Option<ValueType>,
        handler: Handler,
    ) -> Self {
        Self {
            module: ENV_NAMESPACE,
            name,
            params,
            result,
            handler,
        }
    }

    pub(crate) const fn injected(
        name: &'static str,
        params: &'static [ValueType],
        result: Option<ValueType>,
        handler: Handler,
    ) -> Self {
        Self {
            module: INJECTED_NAMESPACE,
            name,
            params,
            result,
            handler,
        }
    }

    pub fn sig(&self) -> FuncSig {
        FuncSig::new(self.params, self.result)
    }

    /// Type-check `args` and run the handler.
    pub fn call(&self, ctx: &mut Context<'_>, args: &[Value]) -> Result<Option<Value>> {
        let matches = args.len() == self.params.len()
            && args.iter().zip(self.params).all(|(a, &p)| a.ty() == p);
        if !matches {
            return Err(Error::runtime(format!(
                "type mismatch calling {}.{}: expected {}",
                self.module,
                self.name,
                self.sig()
            )));
        }
        trace!(module = self.module, name = self.name, ?args, "intrinsic");
        (self.handler)(ctx, args)
    }
}

/// Positional access to already type-checked arguments.
pub(crate) struct Args<'a>(pub(crate) &'a [Value]);

impl Args<'_> {
    fn get(&self, i: usize) -> Result<Value> {
        self.0
            .get(i)
            .copied()
            .ok_or_else(|| Error::runtime(format!("missing argument {i}")))
    }

    fn mismatch(i: usize, want: ValueType) -> Error {
        Error::runtime(format!("argument {i} is not {want}"))
    }

    pub(crate) fn i32(&self, i: usize) -> Result<i32> {
        match self.get(i)? {
            Value::I32(v) => Ok(v),
            _ => Err(Self::mismatch(i, ValueType::I32)),
        }
    }

    /// An `i32` read as a memory offset or length.
    pub(crate) fn u32(&self, i: usize) -> Result<u32> {
        self.i32(i).map(|v| v as u32)
    }

    pub(crate) fn i64(&self, i: usize) -> Result<i64> {
        match self.get(i)? {
            Value::I64(v) => Ok(v),
            _ => Err(Self::mismatch(i, ValueType::I64)),
        }
    }

    pub(crate) fn u64(&self, i: usize) -> Result<u64> {
        self.i64(i).map(|v| v as u64)
    }

    pub(crate) fn f32(&self, i: usize) -> Result<f32> {
        match self.get(i)? {
            Value::F32(v) => Ok(v),
            _ => Err(Self::mismatch(i, ValueType::F32)),
        }
    }

    pub(crate) fn f64(&self, i: usize) -> Result<f64> {
        match self.get(i)? {
            Value::F64(v) => Ok(v),
            _ => Err(Self::mismatch(i, ValueType::F64)),
        }
    }

    /// Two `i64` halves, low first, joined into 128 bits.
    pub(crate) fn u128(&self, i: usize) -> Result<u128> {
        Ok(gasket_runtime::wide::join(self.u64(i)?, self.u64(i + 1)?))
    }
}

static GROUPS: &[&[Intrinsic]] = &[
    action::INTRINSICS,
    builtins::INTRINSICS,
    console::INTRINSICS,
    context_free::INTRINSICS,
    crypto::INTRINSICS,
    database::INTRINSICS,
    memory::INTRINSICS,
    softfloat::INTRINSICS,
    system::INTRINSICS,
];

/// Every intrinsic, in both namespaces.
pub fn catalog() -> impl Iterator<Item = &'static Intrinsic> {
    GROUPS.iter().flat_map(|group| group.iter())
}

pub fn lookup(module: &str, name: &str) -> Option<&'static Intrinsic> {
    catalog().find(|i| i.module == module && i.name == name)
}

/// Binds a module's function imports to intrinsics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    validating: bool,
}

impl Resolver {
    /// Resolver for instrumented modules: both namespaces are visible.
    pub fn new() -> Self {
        Self { validating: false }
    }

    /// Resolver for untrusted contract code: only `env` is visible.
    pub fn validating() -> Self {
        Self { validating: true }
    }

    pub fn resolve(&self, module: &str, name: &str, sig: &FuncSig) -> Result<&'static Intrinsic> {
        let visible = module == ENV_NAMESPACE || (!self.validating && module == INJECTED_NAMESPACE);
        let intrinsic = visible
            .then(|| lookup(module, name))
            .flatten()
            .ok_or_else(|| Error::runtime(format!("unresolved import {module}.{name}")))?;
        if intrinsic.sig() != *sig {
            return Err(Error::runtime(format!(
                "import {module}.{name} declared as {sig}, but the host provides {}",
                intrinsic.sig()
            )));
        }
        Ok(intrinsic)
    }

    /// Resolve every import of `module`, in function-index order.
    /// Only function imports can be satisfied.
    pub fn link(&self, module: &Module) -> Result<Vec<&'static Intrinsic>> {
        module
            .imports
            .iter()
            .map(|import| match import.kind {
                ImportKind::Function(type_idx) => {
                    let sig = module.types.get(type_idx as usize).ok_or_else(|| {
                        Error::runtime(format!("import {} has no type", import.name))
                    })?;
                    self.resolve(&import.module, &import.name, sig)
                }
                _ => Err(Error::runtime(format!(
                    "unresolved import {}.{}: only functions can be imported",
                    import.module, import.name
                ))),
            })
            .collect()
    }
}
