//! Per-invocation state seen by intrinsics.

use gasket_runtime::LinearMemory;

use crate::action::Action;
use crate::error::{Error, Result};
use crate::host::Host;
use crate::sandbox::{Invocation, SandboxConfig};
use crate::types::{Address, StateKey};

/// Everything an intrinsic may touch during one invocation.
///
/// Gas only ever goes down. An intrinsic charges with [`Context::use_gas`]
/// before any side effect, so a failed charge leaves the host untouched.
pub struct Context<'a> {
    pub(crate) host: &'a mut dyn Host,
    pub(crate) memory: &'a mut LinearMemory,
    pub(crate) gas: &'a mut u64,
    pub(crate) action: &'a Action,
    pub(crate) invocation: &'a Invocation<'a>,
    pub(crate) config: &'a SandboxConfig,
    pub(crate) console: String,
    /// Page limit for `memory.grow`, set when a module is entered.
    pub(crate) max_pages: u32,
}

impl<'a> Context<'a> {
    pub fn new(
        host: &'a mut dyn Host,
        memory: &'a mut LinearMemory,
        gas: &'a mut u64,
        action: &'a Action,
        invocation: &'a Invocation<'a>,
        config: &'a SandboxConfig,
    ) -> Self {
        Self {
            host,
            memory,
            gas,
            action,
            invocation,
            config,
            console: String::new(),
            max_pages: config.max_memory_pages,
        }
    }

    /// Deduct `cost`, or fail without deducting anything.
    pub fn use_gas(&mut self, cost: u64) -> Result<()> {
        if *self.gas < cost {
            return Err(Error::runtime(format!(
                "gas limit exceeded: need {cost}, have {}",
                *self.gas
            )));
        }
        *self.gas -= cost;
        Ok(())
    }

    pub fn remaining_gas(&self) -> u64 {
        *self.gas
    }

    pub fn memory(&self) -> &LinearMemory {
        &*self.memory
    }

    pub fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut *self.memory
    }

    /// `memory.grow` for engines: old page count, or -1.
    pub fn grow_memory(&mut self, delta: u32) -> i32 {
        self.memory.grow(delta, self.max_pages)
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }

    pub fn action(&self) -> &Action {
        self.action
    }

    pub fn state_key(&self) -> StateKey {
        self.invocation.state_key
    }

    pub fn depth(&self) -> u32 {
        self.invocation.depth
    }

    pub fn from(&self) -> &Address {
        &self.invocation.from
    }

    pub fn to(&self) -> &Address {
        &self.invocation.to
    }

    pub fn owner(&self) -> &Address {
        &self.invocation.owner
    }

    pub fn user(&self) -> &Address {
        &self.invocation.user
    }

    pub fn amount(&self) -> u64 {
        self.invocation.amount
    }

    pub fn config(&self) -> &SandboxConfig {
        self.config
    }

    /// Console output buffered so far.
    pub fn console(&self) -> &str {
        &self.console
    }

    pub(crate) fn take_console(&mut self) -> String {
        std::mem::take(&mut self.console)
    }
}
