//! gasket: a metered WebAssembly smart-contract sandbox.
//!
//! Contract code goes through [`passes::instrument`] once per code hash:
//! every basic block is charged through an injected `use_gas` import,
//! every float instruction becomes a call to a deterministic software
//! implementation, and the declared memory maximum is clamped. The
//! instrumented module is handed to an external [`Engine`] and cached.
//!
//! [`Sandbox::run`] then resolves an action payload against the cached
//! module and runs its `apply` export with metered [`intrinsics`] backed
//! by a [`Host`].

pub mod action;
pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod gas;
pub mod host;
pub mod injector;
pub mod intrinsics;
pub mod module;
pub mod name;
pub mod passes;
pub mod sandbox;
pub mod types;

pub use action::Action;
pub use cache::{InstantiatedModule, ModuleCache};
pub use context::Context;
pub use engine::{Engine, Instance};
pub use error::{Error, Result};
pub use host::{Host, NestedCall};
pub use name::Name;
pub use passes::{instrument, InstrumentOptions, Instrumented};
pub use sandbox::{Execution, Invocation, Sandbox, SandboxConfig};
pub use types::{Address, Digest, FuncSig, StateKey, Value, ValueType};
