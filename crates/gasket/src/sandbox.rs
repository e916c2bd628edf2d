//! The invocation boundary a host process calls into.

use std::sync::{Arc, Mutex, PoisonError};

use gasket_runtime::LinearMemory;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::cache::{InstantiatedModule, ModuleCache};
use crate::context::Context;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::intrinsics::Resolver;
use crate::module;
use crate::passes::{InstrumentOptions, DEFAULT_MAX_MEMORY_PAGES};
use crate::types::{Address, StateKey};

/// Limits applied to every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Ceiling for declared memory maxima, in 64 KiB pages.
    pub max_memory_pages: u32,
    /// Deepest nesting allowed for `call_action`.
    pub max_call_depth: u32,
    /// Bytes of an assertion message kept in the fault.
    pub max_assert_message: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: DEFAULT_MAX_MEMORY_PAGES,
            max_call_depth: 16,
            max_assert_message: 1024,
        }
    }
}

/// One request to run contract code.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Raw, uninstrumented module bytes.
    pub code: &'a [u8],
    /// 8-byte little-endian action name followed by the action data.
    pub payload: &'a [u8],
    pub from: Address,
    pub to: Address,
    pub owner: Address,
    pub user: Address,
    pub amount: u64,
    pub state_key: StateKey,
    /// 0 for a top-level call, incremented by each `call_action`.
    pub depth: u32,
}

/// Outcome of [`Sandbox::run`].
#[derive(Debug)]
pub struct Execution {
    pub result: Result<()>,
    /// Everything the contract printed, including output written before a
    /// fault.
    pub console: String,
}

/// Runs contracts against a shared module cache.
///
/// Memories are pooled. A top-level invocation reuses the one canonical
/// memory; an invocation nested inside it through the host's
/// `call_action` checks out another one, so the caller's memory survives
/// the callee untouched. Each checked-out memory is exclusive to its
/// invocation.
pub struct Sandbox {
    config: SandboxConfig,
    cache: ModuleCache,
    memories: Mutex<Vec<LinearMemory>>,
}

impl Sandbox {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self::with_config(engine, SandboxConfig::default())
    }

    pub fn with_config(engine: Arc<dyn Engine>, config: SandboxConfig) -> Self {
        let options = InstrumentOptions {
            max_memory_pages: config.max_memory_pages,
        };
        Self {
            config,
            cache: ModuleCache::new(engine, options),
            memories: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Check that `code` decodes and imports only what contracts may import.
    pub fn validate(code: &[u8]) -> Result<()> {
        let module = module::decode(code)?;
        Resolver::validating().link(&module)?;
        Ok(())
    }

    /// Run an invocation and collapse the outcome into a status code:
    /// 0 on success, [`Error::code`] otherwise.
    pub fn execute(&self, invocation: &Invocation<'_>, gas: &mut u64, host: &mut dyn Host) -> i32 {
        match self.run(invocation, gas, host).result {
            Ok(()) => 0,
            Err(e) => e.code(),
        }
    }

    /// Run an invocation, charging `gas`.
    ///
    /// Whatever happens, `gas` holds the remaining budget afterwards. Host
    /// side effects of a failed invocation are for the host to roll back.
    pub fn run(&self, invocation: &Invocation<'_>, gas: &mut u64, host: &mut dyn Host) -> Execution {
        let mut console = String::new();
        let result = self.run_inner(invocation, gas, host, &mut console);
        match &result {
            Ok(()) if !console.is_empty() => info!(depth = invocation.depth, "CONSOLE OUTPUT: {console}"),
            Err(e) if !console.is_empty() => {
                warn!(depth = invocation.depth, error = %e, "pending console output: {console}")
            }
            _ => {}
        }
        Execution { result, console }
    }

    fn run_inner(
        &self,
        invocation: &Invocation<'_>,
        gas: &mut u64,
        host: &mut dyn Host,
        console: &mut String,
    ) -> Result<()> {
        if invocation.depth > self.config.max_call_depth {
            return Err(Error::runtime(format!(
                "call depth {} exceeds the limit of {}",
                invocation.depth, self.config.max_call_depth
            )));
        }

        let action = Action::from_payload(invocation.payload)?;
        let code_id = host.sha256(invocation.code);
        let module = self.cache.get_or_build(code_id, invocation.code)?;
        debug!(%code_id, action = %action.name, depth = invocation.depth, "invoking");

        let mut memory = self.checkout();
        let result = self.apply(&module, &mut memory, invocation, &action, gas, host, console);
        self.checkin(memory);
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        module: &InstantiatedModule,
        memory: &mut LinearMemory,
        invocation: &Invocation<'_>,
        action: &Action,
        gas: &mut u64,
        host: &mut dyn Host,
        console: &mut String,
    ) -> Result<()> {
        let mut ctx = Context::new(host, memory, gas, action, invocation, &self.config);
        let result = module.apply(&mut ctx, action.name);
        *console = ctx.take_console();
        result
    }

    fn checkout(&self) -> LinearMemory {
        self.memories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default()
    }

    fn checkin(&self, memory: LinearMemory) {
        self.memories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(memory);
    }
}
