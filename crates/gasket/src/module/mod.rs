//! Owned module AST.
//!
//! The AST keeps exactly what the instrumentation passes rewrite and what
//! the encoder needs to write the module back out. Function bodies are
//! instruction lists: `call` targets are parsed out so they can be
//! remapped, every other instruction keeps its original encoding.

mod decode;
mod encode;

pub use decode::decode;
pub use encode::encode;

use wasm_encoder::{Encode, Instruction};

use crate::types::{FuncSig, ValueType};

/// Opcode of the `call` instruction.
pub const CALL: u8 = 0x10;

/// A decoded module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Type section: function signatures.
    pub types: Vec<FuncSig>,
    /// Imports of every kind, in section order.
    pub imports: Vec<Import>,
    /// Defined functions, in index order after the function imports.
    pub functions: Vec<Function>,
    /// Defined table (MVP allows at most one, always `funcref`).
    pub table: Option<Limits>,
    /// Defined memory (MVP allows at most one).
    pub memory: Option<Limits>,
    pub globals: Vec<Global>,
    pub exports: Vec<Export>,
    pub start: Option<u32>,
    pub elements: Vec<ElementSegment>,
    pub data: Vec<DataSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    /// Imported function (index into the type section).
    Function(u32),
    Table(Limits),
    Memory(Limits),
    Global { ty: ValueType, mutable: bool },
}

/// Table or memory limits. Memory limits are in 64 KiB pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub initial: u32,
    pub maximum: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Index into the type section.
    pub type_idx: u32,
    /// Local declarations as `(count, type)` runs, parameters excluded.
    pub locals: Vec<(u32, ValueType)>,
    /// Instructions, including the final `end`.
    pub body: Vec<Instr>,
}

/// One instruction of a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `call` with its target function index.
    Call(u32),
    /// Any other instruction, in its original encoding.
    Raw(Vec<u8>),
}

impl Instr {
    pub fn opcode(&self) -> u8 {
        match self {
            Instr::Call(_) => CALL,
            Instr::Raw(bytes) => bytes.first().copied().unwrap_or_default(),
        }
    }

    /// `i64.const value`.
    pub fn i64_const(value: i64) -> Self {
        let mut bytes = Vec::with_capacity(10);
        Instruction::I64Const(value).encode(&mut bytes);
        Instr::Raw(bytes)
    }

    /// Append the binary encoding to `sink`.
    pub fn encode_into(&self, sink: &mut Vec<u8>) {
        match self {
            Instr::Call(idx) => Instruction::Call(*idx).encode(sink),
            Instr::Raw(bytes) => sink.extend_from_slice(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub ty: ValueType,
    pub mutable: bool,
    pub init: InitValue,
}

/// Constant initializer of a global.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitValue {
    I32(i32),
    I64(i64),
    /// Raw bits, so NaN payloads survive a round trip.
    F32(u32),
    F64(u64),
    GlobalGet(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Func,
    Table,
    Memory,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub index: u32,
}

/// An active element segment for table 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSegment {
    pub offset: u32,
    pub functions: Vec<u32>,
}

/// An active data segment for memory 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    pub offset: u32,
    pub bytes: Vec<u8>,
}

impl Module {
    /// Number of imported functions; they occupy the low end of the
    /// function index space.
    pub fn num_imported_functions(&self) -> u32 {
        self.imports
            .iter()
            .filter(|i| matches!(i.kind, ImportKind::Function(_)))
            .count() as u32
    }

    /// Total size of the function index space.
    pub fn num_functions(&self) -> u32 {
        self.num_imported_functions() + self.functions.len() as u32
    }

    /// Signature of a function by index, imported or defined.
    pub fn func_sig(&self, func_idx: u32) -> Option<&FuncSig> {
        let type_idx = self.func_type_idx(func_idx)?;
        self.types.get(type_idx as usize)
    }

    fn func_type_idx(&self, func_idx: u32) -> Option<u32> {
        let mut imported = 0u32;
        for import in &self.imports {
            if let ImportKind::Function(type_idx) = import.kind {
                if imported == func_idx {
                    return Some(type_idx);
                }
                imported += 1;
            }
        }
        self.functions
            .get((func_idx - imported) as usize)
            .map(|f| f.type_idx)
    }

    /// Function index of an exported function.
    pub fn export_func(&self, name: &str) -> Option<u32> {
        self.exports
            .iter()
            .find(|e| e.kind == ExportKind::Func && e.name == name)
            .map(|e| e.index)
    }

    /// The declared memory, defined or imported.
    pub fn memory_limits(&self) -> Option<Limits> {
        self.memory.or_else(|| {
            self.imports.iter().find_map(|i| match i.kind {
                ImportKind::Memory(limits) => Some(limits),
                _ => None,
            })
        })
    }

    /// Index of the first type equal to `sig`, appending one if absent.
    pub fn intern_type(&mut self, sig: &FuncSig) -> u32 {
        if let Some(idx) = self.types.iter().position(|t| t == sig) {
            return idx as u32;
        }
        self.types.push(sig.clone());
        (self.types.len() - 1) as u32
    }
}
