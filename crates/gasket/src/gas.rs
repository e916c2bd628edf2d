//! Gas prices.
//!
//! [`GAS_TABLE`] prices single-byte opcodes; the instrumenter sums it per
//! basic block. The constants below price host intrinsics, which charge
//! themselves before doing any work.

/// Host call overhead.
pub const CALL_BASE: u64 = 100;

pub const RECOVER_KEY: u64 = 450_000;
pub const SHA256_BASE: u64 = 2_400;
pub const SHA256_BYTE: u64 = 3;

pub const LOG_0: u64 = 80_000;
pub const LOG_1: u64 = 90_000;
pub const LOG_2: u64 = 100_000;
pub const LOG_DATA: u64 = 1_000;

pub const MEMOP_BYTE: u64 = 3;

pub const TRANSFER: u64 = 1_000_000;

pub const DBSTORE_BASE: u64 = 1_000_000;
pub const DBSTORE_BYTE: u64 = 100_000;
pub const DBLOAD_BASE: u64 = 1_000_000;
pub const DBLOAD_BYTE: u64 = 100_000;
pub const DB_HAS: u64 = 500_000;
pub const DB_RMV: u64 = 500_000;

/// Cost of every single-byte opcode. Prefixed and unassigned opcodes cost 0.
pub static GAS_TABLE: [u32; 256] = build_table();

const fn set(mut table: [u32; 256], from: u8, to: u8, cost: u32) -> [u32; 256] {
    let mut op = from as usize;
    while op <= to as usize {
        table[op] = cost;
        op += 1;
    }
    table
}

const fn build_table() -> [u32; 256] {
    let mut t = [0u32; 256];

    // control: block, loop, if, end and unreachable are free
    t[0x01] = 1; // nop
    t[0x05] = 2; // else
    t[0x0C] = 2; // br
    t[0x0D] = 3; // br_if
    t[0x0E] = 2; // br_table
    t[0x0F] = 2; // return
    t[0x10] = 2; // call
    t[0x11] = 10; // call_indirect

    // parametric, variables, memory access
    t = set(t, 0x1A, 0x1B, 3);
    t = set(t, 0x20, 0x24, 3);
    t = set(t, 0x28, 0x3E, 3);
    t[0x3F] = 100; // memory.size
    t[0x40] = 1000; // memory.grow

    // integer compare
    t = set(t, 0x45, 0x5A, 1);
    // float compare
    t = set(t, 0x5B, 0x66, 100);

    // i32 / i64 arithmetic share a layout, offset by 0x12
    let mut base = 0x67;
    let mut bits_cost = 105;
    while base <= 0x79 {
        t = set(t, base, base + 2, bits_cost); // clz, ctz, popcnt
        t = set(t, base + 3, base + 4, 1); // add, sub
        t[(base + 5) as usize] = 3; // mul
        t = set(t, base + 6, base + 9, 80); // div, rem
        t = set(t, base + 10, base + 12, 1); // and, or, xor
        t = set(t, base + 13, base + 17, 2); // shifts, rotates
        base += 0x12;
        bits_cost = 150;
    }

    // f32 / f64 arithmetic share a layout, offset by 0x0E
    let mut base = 0x8B;
    while base <= 0x99 {
        t = set(t, base, base + 5, 100); // abs, neg, ceil, floor, trunc, nearest
        t[(base + 6) as usize] = 2000; // sqrt
        t = set(t, base + 7, base + 8, 200); // add, sub
        t[(base + 9) as usize] = 400; // mul
        t[(base + 10) as usize] = 1000; // div
        t = set(t, base + 11, base + 13, 100); // min, max, copysign
        base += 0x0E;
    }

    // conversions
    t[0xA7] = 3; // i32.wrap_i64
    t = set(t, 0xA8, 0xAB, 100);
    t = set(t, 0xAC, 0xAD, 3); // i64.extend_i32
    t = set(t, 0xAE, 0xBF, 100);

    // sign extension
    t = set(t, 0xC0, 0xC4, 3);

    t
}

/// Cost of a single-byte opcode.
#[inline]
pub fn cost(opcode: u8) -> u64 {
    GAS_TABLE[opcode as usize] as u64
}
