//! Shared fixtures: an in-memory host and an engine whose instances run a
//! Rust closure instead of bytecode.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gasket::intrinsics::Intrinsic;
use gasket::{
    Address, Context, Digest, Engine, Error, Instance, Invocation, NestedCall, Result, Sandbox,
    StateKey, Value,
};
use gasket_runtime::LinearMemory;

pub const FROM: Address = Address([1; 20]);
pub const TO: Address = Address([2; 20]);
pub const OWNER: Address = Address([3; 20]);
pub const USER: Address = Address([4; 20]);

/// Assemble a WAT fixture.
pub fn wasm(source: &str) -> Vec<u8> {
    wat::parse_str(source).expect("fixture should assemble")
}

/// A top-level invocation of `code` with the given payload.
pub fn invocation<'a>(code: &'a [u8], payload: &'a [u8]) -> Invocation<'a> {
    Invocation {
        code,
        payload,
        from: FROM,
        to: TO,
        owner: OWNER,
        user: USER,
        amount: 42,
        state_key: StateKey(7),
        depth: 0,
    }
}

// ─── Host ────────────────────────────────────────────────────────────────────

/// Records every effect. `call_action` re-enters `nested` when set.
#[derive(Default)]
pub struct MockHost {
    pub storage: HashMap<(u64, Vec<u8>), Vec<u8>>,
    pub tables: HashSet<u64>,
    pub logs: Vec<(Vec<Digest>, Vec<u8>)>,
    pub transfers: Vec<(Address, u64)>,
    pub result: Vec<u8>,
    pub last_call_result: Vec<u8>,
    pub keys_seen: HashSet<StateKey>,
    pub nested: Option<Nested>,
    pub deepest_call: u32,
    pub nested_statuses: Vec<i32>,
}

/// Where nested calls go.
pub struct Nested {
    pub sandbox: Arc<Sandbox>,
    pub code: Vec<u8>,
    pub gas: u64,
}

impl MockHost {
    pub fn with_nested(sandbox: Arc<Sandbox>, code: Vec<u8>, gas: u64) -> Self {
        Self {
            nested: Some(Nested { sandbox, code, gas }),
            ..Self::default()
        }
    }
}

impl gasket::Host for MockHost {
    fn db_store(&mut self, key: StateKey, table: u64, k: &[u8], value: &[u8]) {
        self.keys_seen.insert(key);
        self.tables.insert(table);
        self.storage.insert((table, k.to_vec()), value.to_vec());
    }

    fn db_load(&mut self, key: StateKey, table: u64, k: &[u8], buf: &mut [u8]) -> i32 {
        self.keys_seen.insert(key);
        match self.storage.get(&(table, k.to_vec())) {
            Some(value) => {
                let n = buf.len().min(value.len());
                buf[..n].copy_from_slice(&value[..n]);
                value.len() as i32
            }
            None => -1,
        }
    }

    fn db_has_key(&mut self, _: StateKey, table: u64, k: &[u8]) -> bool {
        self.storage.contains_key(&(table, k.to_vec()))
    }

    fn db_remove_key(&mut self, _: StateKey, table: u64, k: &[u8]) {
        self.storage.remove(&(table, k.to_vec()));
    }

    fn db_has_table(&mut self, _: StateKey, table: u64) -> bool {
        self.tables.contains(&table)
    }

    fn db_remove_table(&mut self, _: StateKey, table: u64) {
        self.tables.remove(&table);
        self.storage.retain(|(t, _), _| *t != table);
    }

    fn current_time(&mut self, _: StateKey) -> u64 {
        1_700_000_000
    }

    fn current_height(&mut self, _: StateKey) -> u64 {
        12_345
    }

    fn current_hash(&mut self, _: StateKey) -> (Digest, Digest) {
        (Digest([0xAA; 32]), Digest([0xBB; 32]))
    }

    fn add_log(&mut self, _: StateKey, topics: &[Digest], data: &[u8]) {
        self.logs.push((topics.to_vec(), data.to_vec()));
    }

    fn transfer(&mut self, _: StateKey, to: &Address, amount: u64) {
        self.transfers.push((*to, amount));
    }

    fn call_action(&mut self, key: StateKey, call: NestedCall<'_>) -> i32 {
        self.deepest_call = self.deepest_call.max(call.depth);
        let Some(nested) = &self.nested else {
            return -1;
        };
        let sandbox = Arc::clone(&nested.sandbox);
        let code = nested.code.clone();
        let mut gas = nested.gas;
        let payload = call.payload.to_vec();
        let inv = Invocation {
            code: &code,
            payload: &payload,
            from: TO,
            to: call.to,
            owner: call.to,
            user: USER,
            amount: call.amount,
            state_key: key,
            depth: call.depth,
        };
        let status = sandbox.execute(&inv, &mut gas, self);
        self.nested_statuses.push(status);
        status
    }

    fn call_result(&mut self, _: StateKey, buf: &mut [u8]) -> i32 {
        let n = buf.len().min(self.last_call_result.len());
        buf[..n].copy_from_slice(&self.last_call_result[..n]);
        self.last_call_result.len() as i32
    }

    fn set_result(&mut self, _: StateKey, result: &[u8]) -> i32 {
        self.result = result.to_vec();
        0
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// What a scripted instance can do: call its own imports by name and poke
/// at memory, the way compiled code would.
pub struct Vm<'c, 'a> {
    pub ctx: &'c mut Context<'a>,
    imports: &'c [&'static Intrinsic],
}

impl Vm<'_, '_> {
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>> {
        let intrinsic = self
            .imports
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::runtime(format!("module does not import {name}")))?;
        intrinsic.call(self.ctx, args)
    }

    /// Call an import returning `i32`.
    pub fn call_i32(&mut self, name: &str, args: &[Value]) -> Result<i32> {
        match self.call(name, args)? {
            Some(Value::I32(v)) => Ok(v),
            other => Err(Error::runtime(format!("{name} returned {other:?}"))),
        }
    }

    pub fn memory(&mut self) -> &mut LinearMemory {
        self.ctx.memory_mut()
    }

    pub fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<()> {
        Ok(self.memory().write(offset, bytes)?)
    }

    pub fn imports(&self) -> Vec<(&'static str, &'static str)> {
        self.imports.iter().map(|i| (i.module, i.name)).collect()
    }
}

type Script = dyn Fn(&mut Vm<'_, '_>, &[Value]) -> Result<Option<Value>> + Send + Sync;

/// Engine whose instances run `script` for every export call. It
/// validates the instrumented bytes it is given, so every test through it
/// also checks the pipeline output.
pub struct ScriptedEngine {
    script: Arc<Script>,
    pub instantiations: AtomicUsize,
    pub delay: Duration,
    pub last_imports: Mutex<Vec<(&'static str, &'static str)>>,
}

impl ScriptedEngine {
    pub fn new(
        script: impl Fn(&mut Vm<'_, '_>, &[Value]) -> Result<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Arc::new(script),
            instantiations: AtomicUsize::new(0),
            delay: Duration::ZERO,
            last_imports: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }
}

impl Engine for ScriptedEngine {
    fn instantiate(&self, wasm: &[u8], imports: Vec<&'static Intrinsic>) -> Result<Box<dyn Instance>> {
        wasmparser::validate(wasm).map_err(|e| Error::serialization(e.to_string()))?;
        self.instantiations.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        *self.last_imports.lock().unwrap() = imports.iter().map(|i| (i.module, i.name)).collect();
        Ok(Box::new(ScriptedInstance {
            script: Arc::clone(&self.script),
            imports,
        }))
    }
}

struct ScriptedInstance {
    script: Arc<Script>,
    imports: Vec<&'static Intrinsic>,
}

impl Instance for ScriptedInstance {
    fn invoke(&self, ctx: &mut Context<'_>, _export: &str, args: &[Value]) -> Result<Option<Value>> {
        let mut vm = Vm {
            ctx,
            imports: &self.imports,
        };
        (self.script)(&mut vm, args)
    }
}
