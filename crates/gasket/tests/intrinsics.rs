//! Intrinsics called directly against a context, the way an engine would.

mod common;

use common::{invocation, MockHost, FROM};
use gasket::gas::{CALL_BASE, DB_HAS, LOG_1, LOG_DATA, MEMOP_BYTE, SHA256_BASE, SHA256_BYTE, TRANSFER};
use gasket::injector::INJECTED_NAMESPACE;
use gasket::intrinsics::{self, ENV_NAMESPACE};
use gasket::{Action, Address, Context, Digest, Error, Name, Result, SandboxConfig, Value};
use gasket_runtime::LinearMemory;
use sha2::{Digest as _, Sha256};

struct Harness {
    host: MockHost,
    memory: LinearMemory,
    gas: u64,
    action: Action,
    config: SandboxConfig,
    depth: u32,
    console: String,
}

impl Harness {
    fn new(gas: u64) -> Self {
        Self {
            host: MockHost::default(),
            memory: LinearMemory::with_pages(1),
            gas,
            action: Action {
                name: Name::pack("hi"),
                data: b"payload".to_vec(),
            },
            config: SandboxConfig::default(),
            depth: 0,
            console: String::new(),
        }
    }

    fn call(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>> {
        let intrinsic = intrinsics::lookup(ENV_NAMESPACE, name)
            .or_else(|| intrinsics::lookup(INJECTED_NAMESPACE, name))
            .unwrap_or_else(|| panic!("no intrinsic named {name}"));
        let mut inv = invocation(&[], &[]);
        inv.depth = self.depth;
        let mut ctx = Context::new(
            &mut self.host,
            &mut self.memory,
            &mut self.gas,
            &self.action,
            &inv,
            &self.config,
        );
        let result = intrinsic.call(&mut ctx, args);
        self.console.push_str(ctx.console());
        result
    }

    fn i32(&mut self, name: &str, args: &[Value]) -> i32 {
        match self.call(name, args).unwrap() {
            Some(Value::I32(v)) => v,
            other => panic!("{name} returned {other:?}"),
        }
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) {
        self.memory.write(offset, bytes).unwrap();
    }

    fn read(&self, offset: u32, len: u32) -> &[u8] {
        self.memory.slice(offset, len).unwrap()
    }
}

use Value::{F32, F64, I32, I64};

// ─── Calling convention ──────────────────────────────────────────────────────

#[test]
fn arguments_are_type_checked() {
    let mut h = Harness::new(1_000);
    let err = h.call("printi", &[I32(1)]).unwrap_err();
    assert!(matches!(err, Error::Runtime(ref m) if m.starts_with("type mismatch calling env.printi")));
    assert!(h.call("memset", &[I32(0), I32(0)]).is_err());
}

#[test]
fn out_of_bounds_pointers_fault() {
    let mut h = Harness::new(1_000);
    let err = h.call("prints_l", &[I32(65_530), I32(10)]).unwrap_err();
    assert_eq!(err, Error::Runtime("access violation".into()));
}

// ─── Memory ──────────────────────────────────────────────────────────────────

#[test]
fn memcpy_rejects_overlap() {
    let mut h = Harness::new(10_000);
    h.write(0, b"abcdef");

    assert_eq!(h.i32("memcpy", &[I32(10), I32(0), I32(6)]), 10);
    assert_eq!(h.read(10, 6), b"abcdef");
    assert_eq!(h.gas, 10_000 - (CALL_BASE + 6 * MEMOP_BYTE));

    let err = h.call("memcpy", &[I32(2), I32(0), I32(4)]).unwrap_err();
    assert!(matches!(err, Error::OverlappingMemory(_)));
    assert_eq!(err.code(), 20005);

    assert_eq!(h.i32("memmove", &[I32(2), I32(0), I32(4)]), 2);
    assert_eq!(h.read(0, 6), b"ababcd");
}

#[test]
fn memcmp_and_memset() {
    let mut h = Harness::new(10_000);
    h.write(0, b"abc");
    h.write(8, b"abd");

    assert_eq!(h.i32("memcmp", &[I32(0), I32(8), I32(3)]), -1);
    assert_eq!(h.i32("memcmp", &[I32(8), I32(0), I32(3)]), 1);
    assert_eq!(h.i32("memcmp", &[I32(0), I32(8), I32(2)]), 0);

    assert_eq!(h.i32("memset", &[I32(20), I32(0x17f), I32(3)]), 20);
    assert_eq!(h.read(20, 4), &[0x7f, 0x7f, 0x7f, 0]);
}

// ─── Action ──────────────────────────────────────────────────────────────────

#[test]
fn read_action_data_reports_size_then_copies() {
    let mut h = Harness::new(10_000);

    assert_eq!(h.i32("read_action_data", &[I32(0), I32(0)]), 7);
    assert_eq!(h.gas, 10_000 - CALL_BASE);

    assert_eq!(h.i32("read_action_data", &[I32(100), I32(4)]), 4);
    assert_eq!(h.read(100, 5), b"payl\0");
    assert_eq!(h.gas, 10_000 - 2 * CALL_BASE - 7 * MEMOP_BYTE);

    assert_eq!(h.i32("action_data_size", &[]), 7);
}

#[test]
fn address_getters_copy_at_most_twenty_bytes() {
    let mut h = Harness::new(10_000);
    h.call("get_from", &[I32(0), I32(64)]).unwrap();
    assert_eq!(h.read(0, 21), [&FROM.0[..], &[0u8][..]].concat());

    h.call("get_to", &[I32(100), I32(3)]).unwrap();
    assert_eq!(h.read(100, 4), &[2, 2, 2, 0]);
    assert_eq!(h.gas, 10_000 - 2 * (CALL_BASE + 20 * MEMOP_BYTE));

    assert!(matches!(h.call("get_amount", &[]).unwrap(), Some(I64(42))));
}

#[test]
fn transfer_checks_the_address_length() {
    let mut h = Harness::new(10 * TRANSFER);
    let to = Address([9; 20]);
    h.write(0, to.as_bytes());

    h.call("transfer", &[I32(0), I32(20), I64(500)]).unwrap();
    assert_eq!(h.host.transfers, vec![(to, 500)]);

    let err = h.call("transfer", &[I32(0), I32(21), I64(500)]).unwrap_err();
    assert_eq!(err, Error::InvalidAddress("address exception".into()));
    assert_eq!(h.host.transfers.len(), 1);
}

#[test]
fn transfer_without_gas_moves_nothing() {
    let mut h = Harness::new(TRANSFER - 1);
    h.write(0, &[9; 20]);

    let err = h.call("transfer", &[I32(0), I32(20), I64(500)]).unwrap_err();

    assert!(matches!(err, Error::Runtime(_)));
    assert!(h.host.transfers.is_empty());
    assert_eq!(h.gas, TRANSFER - 1);
}

#[test]
fn call_action_refuses_to_nest_past_the_limit() {
    let mut h = Harness::new(10_000);
    h.depth = h.config.max_call_depth;
    h.write(0, &[5; 20]);

    let err = h
        .call("call_action", &[I32(0), I32(20), I32(32), I32(8), I64(0), I32(0), I32(0)])
        .unwrap_err();

    assert!(matches!(err, Error::Runtime(ref m) if m.contains("call depth")));
    assert_eq!(h.host.deepest_call, 0);
}

#[test]
fn call_action_hands_off_one_level_deeper() {
    let mut h = Harness::new(10_000);
    h.depth = 3;
    h.write(0, &[5; 20]);

    // No nested sandbox configured: the mock reports -1.
    let status = h.i32(
        "call_action",
        &[I32(0), I32(20), I32(32), I32(8), I64(0), I32(0), I32(0)],
    );

    assert_eq!(status, -1);
    assert_eq!(h.host.deepest_call, 4);
}

#[test]
fn results_round_trip_through_the_host() {
    let mut h = Harness::new(10_000);
    h.write(0, b"done");
    assert_eq!(h.i32("set_result", &[I32(0), I32(4)]), 0);
    assert_eq!(h.host.result, b"done");

    h.host.last_call_result = b"callee".to_vec();
    assert_eq!(h.i32("call_result", &[I32(10), I32(3)]), 6);
    assert_eq!(h.read(10, 4), b"cal\0");
}

// ─── Database ────────────────────────────────────────────────────────────────

#[test]
fn storage_round_trip() {
    let mut h = Harness::new(100_000_000);
    h.write(0, b"key");
    h.write(16, b"value");

    h.call("db_store", &[I64(7), I32(0), I32(3), I32(16), I32(5)]).unwrap();
    assert_eq!(h.i32("db_has_key", &[I64(7), I32(0), I32(3)]), 1);
    assert_eq!(h.i32("db_has_table", &[I64(7)]), 1);

    assert_eq!(h.i32("db_load", &[I64(7), I32(0), I32(3), I32(100), I32(3)]), 5);
    assert_eq!(h.read(100, 4), b"val\0");

    let before = h.gas;
    h.call("db_remove_key", &[I64(7), I32(0), I32(3)]).unwrap();
    assert_eq!(h.i32("db_has_key", &[I64(7), I32(0), I32(3)]), 0);
    assert_eq!(h.i32("db_load", &[I64(7), I32(0), I32(3), I32(100), I32(0)]), -1);
    assert!(before - h.gas > DB_HAS);

    h.call("db_remove_table", &[I64(7)]).unwrap();
    assert_eq!(h.i32("db_has_table", &[I64(7)]), 0);
}

// ─── System ──────────────────────────────────────────────────────────────────

#[test]
fn chain_state_queries() {
    let mut h = Harness::new(10_000);
    assert!(matches!(h.call("current_time", &[]).unwrap(), Some(I64(1_700_000_000))));
    assert!(matches!(h.call("current_height", &[]).unwrap(), Some(I64(12_345))));

    h.call("current_hash", &[I32(0), I32(32)]).unwrap();
    assert_eq!(h.read(0, 32), &[0xAA; 32]);
    assert_eq!(h.read(32, 32), &[0xBB; 32]);
}

#[test]
fn logs_carry_their_topics() {
    let mut h = Harness::new(1_000_000);
    h.write(0, &[1; 32]);
    h.write(32, &[2; 32]);
    h.write(64, b"event");

    h.call("log_1", &[I32(64), I32(5), I32(0), I32(32)]).unwrap();

    assert_eq!(
        h.host.logs,
        vec![(vec![Digest([1; 32]), Digest([2; 32])], b"event".to_vec())]
    );
    assert_eq!(h.gas, 1_000_000 - LOG_1 - 5 * LOG_DATA);
}

// ─── Crypto ──────────────────────────────────────────────────────────────────

#[test]
fn sha256_through_memory() {
    let mut h = Harness::new(100_000);
    h.write(0, b"abc");
    let expected: [u8; 32] = Sha256::digest(b"abc").into();

    h.call("sha256", &[I32(0), I32(3), I32(64)]).unwrap();
    assert_eq!(h.read(64, 32), expected);
    assert_eq!(h.gas, 100_000 - SHA256_BASE - 3 * SHA256_BYTE);

    h.call("assert_sha256", &[I32(0), I32(3), I32(64)]).unwrap();
    h.write(64, &[0; 32]);
    let err = h.call("assert_sha256", &[I32(0), I32(3), I32(64)]).unwrap_err();
    assert_eq!(err, Error::Crypto("hash mismatch".into()));
    assert_eq!(err.code(), 20006);
}

// ─── Assertions ──────────────────────────────────────────────────────────────

#[test]
fn assertion_messages_are_capped() {
    let mut h = Harness::new(10_000);
    h.config.max_assert_message = 4;
    h.write(0, b"overflowing\0");

    h.call("ftl_assert", &[I32(1), I32(0)]).unwrap();
    let err = h.call("ftl_assert", &[I32(0), I32(0)]).unwrap_err();
    assert_eq!(err, Error::Runtime("assertion failure with message: over".into()));

    let err = h.call("ftl_assert_message", &[I32(0), I32(0), I32(8)]).unwrap_err();
    assert_eq!(err, Error::Runtime("assertion failure with message: over".into()));
}

#[test]
fn abort_and_exit() {
    let mut h = Harness::new(10_000);
    assert_eq!(
        h.call("abort", &[]).unwrap_err(),
        Error::Runtime("abort() called".into())
    );
    assert_eq!(h.call("ftl_exit", &[I32(5)]).unwrap_err(), Error::Exit(5));
    assert_eq!(h.gas, 10_000 - CALL_BASE);
}

// ─── Console ─────────────────────────────────────────────────────────────────

#[test]
fn console_output_is_free() {
    let mut h = Harness::new(0);
    h.write(0, b"hi \0");
    h.write(8, &[0xde, 0xad]);

    h.call("prints", &[I32(0)]).unwrap();
    h.call("printi", &[I64(-3)]).unwrap();
    h.call("prints_l", &[I32(2), I32(1)]).unwrap();
    h.call("printui", &[I64(-1)]).unwrap();
    h.call("prints_l", &[I32(2), I32(1)]).unwrap();
    h.call("printn", &[I64(Name::pack("alice").0 as i64)]).unwrap();
    h.call("prints_l", &[I32(2), I32(1)]).unwrap();
    h.call("printhex", &[I32(8), I32(2)]).unwrap();
    h.call("prints_l", &[I32(2), I32(1)]).unwrap();
    h.call("printdf", &[F64(0.5)]).unwrap();
    h.call("prints_l", &[I32(2), I32(1)]).unwrap();
    h.call("printsf", &[F32(-2.0)]).unwrap();

    assert_eq!(
        h.console,
        "hi -3 18446744073709551615 alice dead 5.000000000000000e-01 -2.000000e+00"
    );
    assert_eq!(h.gas, 0);
}

#[test]
fn printqf_prints_binary128() {
    let mut h = Harness::new(1_000);
    h.call("__extenddftf2", &[I32(0), F64(1.25)]).unwrap();
    h.call("printqf", &[I32(0)]).unwrap();
    assert_eq!(h.console, "1.250000000000000e+00");
}

// ─── Compiler builtins ───────────────────────────────────────────────────────

fn halves(v: u128) -> [Value; 2] {
    [I64(v as u64 as i64), I64((v >> 64) as u64 as i64)]
}

fn wide(h: &mut Harness, name: &str, a: u128, b: u128) -> Result<u128> {
    let [la, ha] = halves(a);
    let [lb, hb] = halves(b);
    h.call(name, &[I32(0), la, ha, lb, hb])?;
    Ok(u128::from_le_bytes(h.read(0, 16).try_into().unwrap()))
}

#[test]
fn wide_integer_arithmetic() {
    let mut h = Harness::new(100_000);
    let big = (1u128 << 100) + 12_345;

    assert_eq!(wide(&mut h, "__multi3", big, 3).unwrap(), big * 3);
    assert_eq!(wide(&mut h, "__udivti3", big, 7).unwrap(), big / 7);
    assert_eq!(wide(&mut h, "__umodti3", big, 7).unwrap(), big % 7);
    assert_eq!(wide(&mut h, "__divti3", (-100i128) as u128, 7).unwrap(), (-14i128) as u128);
    assert_eq!(wide(&mut h, "__modti3", (-100i128) as u128, 7).unwrap(), (-2i128) as u128);

    let err = wide(&mut h, "__divti3", big, 0).unwrap_err();
    assert!(matches!(err, Error::Arithmetic(_)));
    assert_eq!(err.code(), 20007);
}

#[test]
fn wide_shifts() {
    let mut h = Harness::new(10_000);
    let [lo, hi] = halves(1);
    h.call("__ashlti3", &[I32(0), lo, hi, I32(100)]).unwrap();
    assert_eq!(h.memory.load_u128(0).unwrap(), 1u128 << 100);

    let [lo, hi] = halves(u128::MAX << 64);
    h.call("__ashrti3", &[I32(0), lo, hi, I32(64)]).unwrap();
    assert_eq!(h.memory.load_u128(0).unwrap(), u128::MAX);
    h.call("__lshrti3", &[I32(0), lo, hi, I32(64)]).unwrap();
    assert_eq!(h.memory.load_u128(0).unwrap(), u64::MAX as u128);
}

/// binary128 bits of a small integer.
fn quad(h: &mut Harness, v: i32) -> u128 {
    h.call("__floatsitf", &[I32(0), I32(v)]).unwrap();
    h.memory.load_u128(0).unwrap()
}

fn to_f64(h: &mut Harness, q: u128) -> f64 {
    let [lo, hi] = halves(q);
    match h.call("__trunctfdf2", &[lo, hi]).unwrap() {
        Some(F64(v)) => v,
        other => panic!("{other:?}"),
    }
}

#[test]
fn quad_arithmetic_and_conversions() {
    let mut h = Harness::new(100_000);
    let one = quad(&mut h, 1);
    let three = quad(&mut h, 3);

    let sum = wide(&mut h, "__addtf3", one, three).unwrap();
    assert_eq!(to_f64(&mut h, sum), 4.0);
    let quotient = wide(&mut h, "__divtf3", one, three).unwrap();
    assert_eq!(to_f64(&mut h, quotient), 1.0 / 3.0);

    let [lo, hi] = halves(quotient);
    assert_eq!(h.i32("__fixtfsi", &[lo, hi]), 0);
    let [lo, hi] = halves(three);
    assert_eq!(h.i32("__fixtfsi", &[lo, hi]), 3);

    h.call("__negtf2", &[I32(0), lo, hi]).unwrap();
    let minus_three = h.memory.load_u128(0).unwrap();
    assert_eq!(to_f64(&mut h, minus_three), -3.0);
    let [lo, hi] = halves(minus_three);
    assert_eq!(h.i32("__fixunstfsi", &[lo, hi]) as u32, u32::MAX);

    let [lo, hi] = halves(12);
    assert!(matches!(h.call("__floattidf", &[lo, hi]).unwrap(), Some(F64(v)) if v == 12.0));
    assert!(matches!(h.call("__floatsidf", &[I32(-2)]).unwrap(), Some(F64(v)) if v == -2.0));

    h.call("__fixdfti", &[I32(0), F64(-5.9)]).unwrap();
    assert_eq!(h.memory.load_u128(0).unwrap(), (-5i128) as u128);
}

#[test]
fn quad_comparisons_and_nan() {
    let mut h = Harness::new(100_000);
    let one = quad(&mut h, 1);
    let two = quad(&mut h, 2);
    let nan = {
        h.call("__extenddftf2", &[I32(0), F64(f64::NAN)]).unwrap();
        h.memory.load_u128(0).unwrap()
    };
    let mut cmp = |name: &str, a: u128, b: u128| {
        let [la, ha] = halves(a);
        let [lb, hb] = halves(b);
        h.i32(name, &[la, ha, lb, hb])
    };

    assert_eq!(cmp("__cmptf2", one, two), -1);
    assert_eq!(cmp("__cmptf2", two, one), 1);
    assert_eq!(cmp("__eqtf2", one, one), 0);
    assert_eq!(cmp("__unordtf2", one, nan), 1);
    assert_eq!(cmp("__unordtf2", one, two), 0);

    assert_eq!(cmp("__eqtf2", one, nan), 1);
    assert_eq!(cmp("__netf2", one, nan), 1);
    assert_eq!(cmp("__letf2", one, nan), 1);
    assert_eq!(cmp("__getf2", one, nan), -1);
    assert_eq!(cmp("__gttf2", one, nan), 0);
    assert_eq!(cmp("__lttf2", one, nan), 0);
}

// ─── Software floats ─────────────────────────────────────────────────────────

#[test]
fn software_floats_match_ieee() {
    let mut h = Harness::new(0);
    assert!(matches!(
        h.call("_eosio_f32_add", &[F32(0.1), F32(0.2)]).unwrap(),
        Some(F32(v)) if v == 0.1f32 + 0.2f32
    ));
    assert!(matches!(
        h.call("_eosio_f64_sqrt", &[F64(2.0)]).unwrap(),
        Some(F64(v)) if v == 2f64.sqrt()
    ));
    assert!(matches!(
        h.call("_eosio_f64_nearest", &[F64(2.5)]).unwrap(),
        Some(F64(v)) if v == 2.0
    ));
    assert!(matches!(
        h.call("_eosio_f32_lt", &[F32(1.0), F32(f32::NAN)]).unwrap(),
        Some(I32(0))
    ));
    assert!(matches!(
        h.call("_eosio_ui32_to_f64", &[I32(-1)]).unwrap(),
        Some(F64(v)) if v == u32::MAX as f64
    ));
    assert!(matches!(
        h.call("_eosio_f32_promote", &[F32(1.5)]).unwrap(),
        Some(F64(v)) if v == 1.5
    ));
    assert_eq!(h.gas, 0);
}

#[test]
fn software_truncation_traps() {
    let mut h = Harness::new(0);
    assert!(matches!(
        h.call("_eosio_f64_trunc_i32s", &[F64(-7.9)]).unwrap(),
        Some(I32(-7))
    ));
    assert!(matches!(
        h.call("_eosio_f32_trunc_i64s", &[F32(f32::NAN)]),
        Err(Error::Runtime(_))
    ));
    assert!(matches!(
        h.call("_eosio_f64_trunc_i32u", &[F64(-1.0)]),
        Err(Error::Runtime(_))
    ));
}
