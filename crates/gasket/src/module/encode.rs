//! [`Module`] back to binary, via `wasm-encoder`.

use std::borrow::Cow;

use wasm_encoder::{
    CodeSection, ConstExpr, DataSection, ElementSection, Elements, EntityType, ExportSection,
    FunctionSection, GlobalSection, GlobalType, ImportSection, MemorySection, MemoryType,
    RefType, StartSection, TableSection, TableType, TypeSection, ValType,
};

use super::{ExportKind, ImportKind, InitValue, Limits, Module};

fn table_type(limits: Limits) -> TableType {
    TableType {
        element_type: RefType::FUNCREF,
        table64: false,
        minimum: limits.initial as u64,
        maximum: limits.maximum.map(u64::from),
        shared: false,
    }
}

fn memory_type(limits: Limits) -> MemoryType {
    MemoryType {
        minimum: limits.initial as u64,
        maximum: limits.maximum.map(u64::from),
        memory64: false,
        shared: false,
        page_size_log2: None,
    }
}

fn const_expr(init: InitValue) -> ConstExpr {
    match init {
        InitValue::I32(v) => ConstExpr::i32_const(v),
        InitValue::I64(v) => ConstExpr::i64_const(v),
        InitValue::F32(bits) => ConstExpr::raw(std::iter::once(0x43).chain(bits.to_le_bytes())),
        InitValue::F64(bits) => ConstExpr::raw(std::iter::once(0x44).chain(bits.to_le_bytes())),
        InitValue::GlobalGet(idx) => ConstExpr::global_get(idx),
    }
}

/// Encode a module. Empty sections are omitted.
pub fn encode(module: &Module) -> Vec<u8> {
    let mut out = wasm_encoder::Module::new();

    if !module.types.is_empty() {
        let mut types = TypeSection::new();
        for sig in &module.types {
            let params: Vec<ValType> = sig.params.iter().map(|&p| p.into()).collect();
            let results: Vec<ValType> = sig.result.into_iter().map(Into::into).collect();
            types.ty().function(params, results);
        }
        out.section(&types);
    }

    if !module.imports.is_empty() {
        let mut imports = ImportSection::new();
        for import in &module.imports {
            let ty = match import.kind {
                ImportKind::Function(type_idx) => EntityType::Function(type_idx),
                ImportKind::Table(limits) => EntityType::Table(table_type(limits)),
                ImportKind::Memory(limits) => EntityType::Memory(memory_type(limits)),
                ImportKind::Global { ty, mutable } => EntityType::Global(GlobalType {
                    val_type: ty.into(),
                    mutable,
                    shared: false,
                }),
            };
            imports.import(&import.module, &import.name, ty);
        }
        out.section(&imports);
    }

    if !module.functions.is_empty() {
        let mut functions = FunctionSection::new();
        for f in &module.functions {
            functions.function(f.type_idx);
        }
        out.section(&functions);
    }

    if let Some(limits) = module.table {
        let mut tables = TableSection::new();
        tables.table(table_type(limits));
        out.section(&tables);
    }

    if let Some(limits) = module.memory {
        let mut memories = MemorySection::new();
        memories.memory(memory_type(limits));
        out.section(&memories);
    }

    if !module.globals.is_empty() {
        let mut globals = GlobalSection::new();
        for g in &module.globals {
            let ty = GlobalType {
                val_type: g.ty.into(),
                mutable: g.mutable,
                shared: false,
            };
            globals.global(ty, &const_expr(g.init));
        }
        out.section(&globals);
    }

    if !module.exports.is_empty() {
        let mut exports = ExportSection::new();
        for e in &module.exports {
            let kind = match e.kind {
                ExportKind::Func => wasm_encoder::ExportKind::Func,
                ExportKind::Table => wasm_encoder::ExportKind::Table,
                ExportKind::Memory => wasm_encoder::ExportKind::Memory,
                ExportKind::Global => wasm_encoder::ExportKind::Global,
            };
            exports.export(&e.name, kind, e.index);
        }
        out.section(&exports);
    }

    if let Some(function_index) = module.start {
        out.section(&StartSection { function_index });
    }

    if !module.elements.is_empty() {
        let mut elements = ElementSection::new();
        for seg in &module.elements {
            elements.active(
                None,
                &ConstExpr::i32_const(seg.offset as i32),
                Elements::Functions(Cow::Borrowed(seg.functions.as_slice())),
            );
        }
        out.section(&elements);
    }

    if !module.functions.is_empty() {
        let mut code = CodeSection::new();
        let mut body = Vec::new();
        for f in &module.functions {
            body.clear();
            for instr in &f.body {
                instr.encode_into(&mut body);
            }
            let mut func =
                wasm_encoder::Function::new(f.locals.iter().map(|&(n, ty)| (n, ty.into())));
            func.raw(body.iter().copied());
            code.function(&func);
        }
        out.section(&code);
    }

    if !module.data.is_empty() {
        let mut data = DataSection::new();
        for seg in &module.data {
            data.active(
                0,
                &ConstExpr::i32_const(seg.offset as i32),
                seg.bytes.iter().copied(),
            );
        }
        out.section(&data);
    }

    out.finish()
}
