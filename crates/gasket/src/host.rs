//! Callbacks the embedding process provides.
//!
//! Every callback receives the [`StateKey`] of the invocation that made it,
//! so one host object can serve nested and concurrent invocations.

use sha2::{Digest as _, Sha256};

use crate::types::{Address, Digest, StateKey};

/// An inter-contract call requested through `call_action`.
#[derive(Debug, Clone, Copy)]
pub struct NestedCall<'a> {
    pub to: Address,
    /// Name-prefixed action payload.
    pub payload: &'a [u8],
    pub amount: u64,
    pub storage_delegate: i32,
    pub user_delegate: i32,
    /// Depth the callee runs at.
    pub depth: u32,
}

pub trait Host {
    fn db_store(&mut self, key: StateKey, table: u64, k: &[u8], value: &[u8]);

    /// Copy the stored value into `buf`, returning the full value length,
    /// or a negative number if the key is absent.
    fn db_load(&mut self, key: StateKey, table: u64, k: &[u8], buf: &mut [u8]) -> i32;

    fn db_has_key(&mut self, key: StateKey, table: u64, k: &[u8]) -> bool;

    fn db_remove_key(&mut self, key: StateKey, table: u64, k: &[u8]);

    fn db_has_table(&mut self, key: StateKey, table: u64) -> bool;

    fn db_remove_table(&mut self, key: StateKey, table: u64);

    fn current_time(&mut self, key: StateKey) -> u64;

    fn current_height(&mut self, key: StateKey) -> u64;

    /// Simple and full hash of the current block.
    fn current_hash(&mut self, key: StateKey) -> (Digest, Digest);

    fn add_log(&mut self, key: StateKey, topics: &[Digest], data: &[u8]);

    fn transfer(&mut self, key: StateKey, to: &Address, amount: u64);

    /// Run another contract. The host usually re-enters
    /// [`crate::Sandbox::execute`] with `call.depth`.
    fn call_action(&mut self, key: StateKey, call: NestedCall<'_>) -> i32;

    /// Copy the result of the last nested call into `buf`, returning its
    /// full length.
    fn call_result(&mut self, key: StateKey, buf: &mut [u8]) -> i32;

    fn set_result(&mut self, key: StateKey, result: &[u8]) -> i32;

    fn sha256(&self, data: &[u8]) -> Digest {
        Digest(Sha256::digest(data).into())
    }
}
