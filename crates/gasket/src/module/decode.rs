//! Binary module to [`Module`], via `wasmparser`.

use tracing::debug;
use wasmparser::{
    CompositeInnerType, ConstExpr, DataKind, ElementItems, ElementKind, ExternalKind,
    FunctionBody, Operator, Parser, Payload, TypeRef, Validator, WasmFeatures,
};

use super::{
    DataSegment, ElementSegment, Export, ExportKind, Function, Global, Import, ImportKind,
    InitValue, Instr, Limits, Module,
};
use crate::error::{Error, Result};
use crate::types::{FuncSig, ValueType};

/// Wasm MVP plus mutable-global import/export and sign-extension operators.
fn features() -> WasmFeatures {
    WasmFeatures::WASM1 | WasmFeatures::MUTABLE_GLOBAL | WasmFeatures::SIGN_EXTENSION
}

/// Validate and decode a binary module. Custom sections are dropped.
pub fn decode(wasm: &[u8]) -> Result<Module> {
    Validator::new_with_features(features()).validate_all(wasm)?;

    let mut module = Module::default();
    let mut function_types: Vec<u32> = Vec::new();
    let mut custom_sections = 0usize;

    for payload in Parser::new(0).parse_all(wasm) {
        match payload? {
            Payload::TypeSection(reader) => {
                for rec_group in reader {
                    for sub_type in rec_group?.types() {
                        match &sub_type.composite_type.inner {
                            CompositeInnerType::Func(func_ty) => {
                                module.types.push(func_sig(func_ty)?);
                            }
                            _ => return Err(Error::serialization("non-function type")),
                        }
                    }
                }
            }

            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import?;
                    let kind = match import.ty {
                        TypeRef::Func(type_idx) => ImportKind::Function(type_idx),
                        TypeRef::Table(ty) => ImportKind::Table(limits(ty.initial, ty.maximum)?),
                        TypeRef::Memory(ty) => {
                            ImportKind::Memory(limits(ty.initial, ty.maximum)?)
                        }
                        TypeRef::Global(ty) => ImportKind::Global {
                            ty: ty.content_type.try_into()?,
                            mutable: ty.mutable,
                        },
                        _ => {
                            return Err(Error::serialization(format!(
                                "unsupported import kind for {}.{}",
                                import.module, import.name
                            )))
                        }
                    };
                    module.imports.push(Import {
                        module: import.module.to_string(),
                        name: import.name.to_string(),
                        kind,
                    });
                }
            }

            Payload::FunctionSection(reader) => {
                for type_idx in reader {
                    function_types.push(type_idx?);
                }
            }

            Payload::TableSection(reader) => {
                if let Some(table) = reader.into_iter().next() {
                    let ty = table?.ty;
                    module.table = Some(limits(ty.initial, ty.maximum)?);
                }
            }

            Payload::MemorySection(reader) => {
                if let Some(memory) = reader.into_iter().next() {
                    let ty = memory?;
                    module.memory = Some(limits(ty.initial, ty.maximum)?);
                }
            }

            Payload::GlobalSection(reader) => {
                for global in reader {
                    let global = global?;
                    module.globals.push(Global {
                        ty: global.ty.content_type.try_into()?,
                        mutable: global.ty.mutable,
                        init: const_expr(global.init_expr)?,
                    });
                }
            }

            Payload::ExportSection(reader) => {
                for export in reader {
                    let export = export?;
                    let kind = match export.kind {
                        ExternalKind::Func => ExportKind::Func,
                        ExternalKind::Table => ExportKind::Table,
                        ExternalKind::Memory => ExportKind::Memory,
                        ExternalKind::Global => ExportKind::Global,
                        ExternalKind::Tag => {
                            return Err(Error::serialization("tag exports are not supported"))
                        }
                    };
                    module.exports.push(Export {
                        name: export.name.to_string(),
                        kind,
                        index: export.index,
                    });
                }
            }

            Payload::StartSection { func, .. } => module.start = Some(func),

            Payload::ElementSection(reader) => {
                for element in reader {
                    module.elements.push(element_segment(element?)?);
                }
            }

            Payload::CodeSectionEntry(body) => {
                let type_idx = function_types
                    .get(module.functions.len())
                    .copied()
                    .ok_or_else(|| Error::serialization("code entry without a declared type"))?;
                module.functions.push(function(wasm, body, type_idx)?);
            }

            Payload::DataSection(reader) => {
                for data in reader {
                    let data = data?;
                    let offset_expr = match data.kind {
                        DataKind::Active {
                            memory_index: 0,
                            offset_expr,
                        } => offset_expr,
                        _ => return Err(Error::serialization("unsupported data segment")),
                    };
                    module.data.push(DataSegment {
                        offset: i32_offset(offset_expr, "data")?,
                        bytes: data.data.to_vec(),
                    });
                }
            }

            Payload::CustomSection(_) => custom_sections += 1,

            _ => {}
        }
    }

    debug!(
        types = module.types.len(),
        imports = module.imports.len(),
        functions = module.functions.len(),
        custom_sections,
        "decoded module"
    );
    Ok(module)
}

fn func_sig(ty: &wasmparser::FuncType) -> Result<FuncSig> {
    let params = ty
        .params()
        .iter()
        .map(|&p| ValueType::try_from(p))
        .collect::<Result<Vec<_>>>()?;
    let result = match ty.results() {
        [] => None,
        [r] => Some(ValueType::try_from(*r)?),
        _ => return Err(Error::serialization("multi-value results are not supported")),
    };
    Ok(FuncSig { params, result })
}

fn limits(initial: u64, maximum: Option<u64>) -> Result<Limits> {
    let narrow = |v: u64| u32::try_from(v).map_err(|_| Error::serialization("limit out of range"));
    Ok(Limits {
        initial: narrow(initial)?,
        maximum: maximum.map(narrow).transpose()?,
    })
}

fn const_expr(expr: ConstExpr<'_>) -> Result<InitValue> {
    let mut reader = expr.get_operators_reader();
    Ok(match reader.read()? {
        Operator::I32Const { value } => InitValue::I32(value),
        Operator::I64Const { value } => InitValue::I64(value),
        Operator::F32Const { value } => InitValue::F32(value.bits()),
        Operator::F64Const { value } => InitValue::F64(value.bits()),
        Operator::GlobalGet { global_index } => InitValue::GlobalGet(global_index),
        op => {
            return Err(Error::serialization(format!(
                "unsupported constant expression: {op:?}"
            )))
        }
    })
}

fn i32_offset(expr: ConstExpr<'_>, what: &str) -> Result<u32> {
    match const_expr(expr)? {
        InitValue::I32(v) => Ok(v as u32),
        _ => Err(Error::serialization(format!(
            "{what} segment offset must be i32.const"
        ))),
    }
}

fn element_segment(element: wasmparser::Element<'_>) -> Result<ElementSegment> {
    let offset_expr = match element.kind {
        ElementKind::Active {
            table_index: None | Some(0),
            offset_expr,
        } => offset_expr,
        _ => return Err(Error::serialization("unsupported element segment")),
    };
    let functions = match element.items {
        ElementItems::Functions(reader) => reader
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        ElementItems::Expressions(..) => {
            return Err(Error::serialization("expression element segments are not supported"))
        }
    };
    Ok(ElementSegment {
        offset: i32_offset(offset_expr, "element")?,
        functions,
    })
}

/// Split a body into instructions, each sliced from the original bytes.
fn function(wasm: &[u8], body: FunctionBody<'_>, type_idx: u32) -> Result<Function> {
    let mut locals = Vec::new();
    for local in body.get_locals_reader()? {
        let (count, ty) = local?;
        locals.push((count, ValueType::try_from(ty)?));
    }

    let mut reader = body.get_operators_reader()?;
    let mut instrs = Vec::new();
    while !reader.eof() {
        let start = reader.original_position();
        let op = reader.read()?;
        let end = reader.original_position();
        instrs.push(match op {
            Operator::Call { function_index } => Instr::Call(function_index),
            _ => {
                let bytes = wasm
                    .get(start..end)
                    .ok_or_else(|| Error::serialization("instruction out of range"))?;
                Instr::Raw(bytes.to_vec())
            }
        });
    }

    Ok(Function {
        type_idx,
        locals,
        body: instrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_wat(src: &str) -> Result<Module> {
        decode(&wat::parse_str(src).unwrap())
    }

    #[test]
    fn decodes_sections() {
        let module = decode_wat(
            r#"(module
                (import "env" "printi" (func (param i64)))
                (memory 2 4)
                (table 2 funcref)
                (global (mut i32) (i32.const 1024))
                (global f64 (f64.const 1.5))
                (func $apply (export "apply") (param i64)
                    (local i32 i32) (local f32)
                    local.get 0
                    call 0)
                (func $helper nop)
                (start $helper)
                (elem (i32.const 0) $apply $helper)
                (data (i32.const 16) "hi"))"#,
        )
        .unwrap();

        assert_eq!(module.types.len(), 2);
        assert_eq!(module.num_imported_functions(), 1);
        assert_eq!(
            module.memory,
            Some(Limits {
                initial: 2,
                maximum: Some(4)
            })
        );
        assert_eq!(module.table.map(|t| t.initial), Some(2));
        assert_eq!(module.globals[0].init, InitValue::I32(1024));
        assert_eq!(module.globals[1].init, InitValue::F64(1.5f64.to_bits()));
        assert_eq!(module.export_func("apply"), Some(1));
        assert_eq!(module.start, Some(2));
        assert_eq!(module.elements[0].functions, vec![1, 2]);
        assert_eq!(module.data[0].offset, 16);
        assert_eq!(module.data[0].bytes, b"hi".to_vec());

        let apply = &module.functions[0];
        assert_eq!(apply.locals, vec![(2, ValueType::I32), (1, ValueType::F32)]);
        assert_eq!(
            apply.body,
            vec![Instr::Raw(vec![0x20, 0x00]), Instr::Call(0), Instr::Raw(vec![0x0B])]
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode(b"\0asm\x01\0\0\0\x99"),
            Err(Error::Serialization(_))
        ));
        assert!(matches!(decode(b"not wasm"), Err(Error::Serialization(_))));
    }

    #[test]
    fn rejects_post_mvp_instructions() {
        let err = decode_wat(
            r#"(module (func (param f32) (result i32)
                local.get 0
                i32.trunc_sat_f32_s))"#,
        );
        assert!(matches!(err, Err(Error::Serialization(_))));

        let err = decode_wat(r#"(module (func (result i32 i32) i32.const 0 i32.const 1))"#);
        assert!(matches!(err, Err(Error::Serialization(_))));
    }

    #[test]
    fn accepts_sign_extension() {
        let module = decode_wat(
            r#"(module (func (param i32) (result i32)
                local.get 0
                i32.extend8_s))"#,
        )
        .unwrap();
        assert_eq!(module.functions[0].body[1].opcode(), 0xC0);
    }

    #[test]
    fn rejects_non_constant_segment_offsets() {
        let err = decode_wat(
            r#"(module
                (import "env" "base" (global i32))
                (memory 1)
                (data (global.get 0) "x"))"#,
        );
        assert!(matches!(err, Err(Error::Serialization(_))));
    }
}
