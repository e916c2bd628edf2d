//! `gasket-runtime`: deterministic building blocks for the gasket sandbox.
//!
//! This crate is `#![no_std]` by default. It provides:
//! - `softfloat`: an integer-only IEEE-754 engine for binary32, binary64 and binary128
//! - `ops`: Wasm floating-point operators built on that engine (trapping truncations included)
//! - `wide`: 128-bit integer and binary128 helpers used by the compiler-builtin intrinsics
//! - `LinearMemory` (behind the `alloc` feature): a resettable, bounds-checked linear memory

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(test)]
extern crate std;

/// WebAssembly page size: 64 KiB per the Wasm specification.
pub const PAGE_SIZE: usize = 65536;

#[cfg(feature = "alloc")]
mod memory;
#[cfg(feature = "alloc")]
pub use memory::LinearMemory;

pub mod ops;
pub mod softfloat;
pub mod wide;

/// Runtime faults raised by memory accesses and arithmetic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    /// Memory access out of bounds.
    OutOfBounds,
    /// Integer division (or remainder) by zero.
    DivisionByZero,
    /// Float-to-integer conversion of a NaN or out-of-range value.
    IntegerOverflow,
}

impl core::fmt::Display for Trap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Trap::OutOfBounds => "access violation",
            Trap::DivisionByZero => "divide by zero",
            Trap::IntegerOverflow => "integer overflow in float conversion",
        };
        f.write_str(msg)
    }
}

/// Result type for runtime operations.
pub type TrapResult<T> = Result<T, Trap>;
