//! Plain value types shared across the crate.

use std::fmt;

use crate::error::{Error, Result};

/// A 20-byte account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const LEN: usize = 20;

    /// Build from a byte slice, which must be exactly 20 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        bytes
            .try_into()
            .map(Address)
            .map_err(|_| Error::InvalidAddress(format!("expected 20 bytes, got {}", bytes.len())))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub const LEN: usize = 32;

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Opaque per-invocation handle passed back to every host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StateKey(pub u64);

/// Wasm number types. Reference and vector types are rejected at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

impl ValueType {
    pub fn is_float(self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        })
    }
}

impl TryFrom<wasmparser::ValType> for ValueType {
    type Error = Error;

    fn try_from(ty: wasmparser::ValType) -> Result<Self> {
        match ty {
            wasmparser::ValType::I32 => Ok(ValueType::I32),
            wasmparser::ValType::I64 => Ok(ValueType::I64),
            wasmparser::ValType::F32 => Ok(ValueType::F32),
            wasmparser::ValType::F64 => Ok(ValueType::F64),
            other => Err(Error::serialization(format!(
                "unsupported value type: {other}"
            ))),
        }
    }
}

impl From<ValueType> for wasm_encoder::ValType {
    fn from(ty: ValueType) -> Self {
        match ty {
            ValueType::I32 => wasm_encoder::ValType::I32,
            ValueType::I64 => wasm_encoder::ValType::I64,
            ValueType::F32 => wasm_encoder::ValType::F32,
            ValueType::F64 => wasm_encoder::ValType::F64,
        }
    }
}

/// A function signature: MVP functions return at most one value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncSig {
    pub params: Vec<ValueType>,
    pub result: Option<ValueType>,
}

impl FuncSig {
    pub fn new(params: &[ValueType], result: Option<ValueType>) -> Self {
        Self {
            params: params.to_vec(),
            result,
        }
    }
}

impl fmt::Display for FuncSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p}")?;
        }
        f.write_str(")")?;
        if let Some(r) = self.result {
            write!(f, " -> {r}")?;
        }
        Ok(())
    }
}

/// A runtime value crossing the host boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn ty(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }
}
