//! Properties of the instrumentation pipeline, checked on its binary output.

mod common;

use common::wasm;
use gasket::gas;
use gasket::injector::{Injector, INJECTED_NAMESPACE};
use gasket::module::{decode, ExportKind};
use gasket::passes::float::is_float_op;
use gasket::{instrument, Error, FuncSig, InstrumentOptions, ValueType};
use wasmparser::{Operator, Parser, Payload, TypeRef};

/// Imports and, per defined function, its operators, read back with
/// wasmparser.
struct Output<'a> {
    imports: Vec<(String, String)>,
    bodies: Vec<Vec<Operator<'a>>>,
}

fn read_output(bytes: &[u8]) -> Output<'_> {
    let mut imports = Vec::new();
    let mut bodies = Vec::new();
    for payload in Parser::new(0).parse_all(bytes) {
        match payload.unwrap() {
            Payload::ImportSection(reader) => {
                for import in reader {
                    let import = import.unwrap();
                    assert!(matches!(import.ty, TypeRef::Func(_) | TypeRef::Memory(_)));
                    imports.push((import.module.to_string(), import.name.to_string()));
                }
            }
            Payload::CodeSectionEntry(body) => {
                let ops = body
                    .get_operators_reader()
                    .unwrap()
                    .into_iter()
                    .collect::<Result<Vec<_>, _>>()
                    .unwrap();
                bodies.push(ops);
            }
            _ => {}
        }
    }
    Output { imports, bodies }
}

fn instrumented(source: &str) -> gasket::Instrumented {
    let out = instrument(&wasm(source), &InstrumentOptions::default()).unwrap();
    wasmparser::validate(&out.wasm).unwrap();
    out
}

/// The `i64.const` amounts passed to `use_gas` (import 0), per function.
fn charges(output: &Output<'_>) -> Vec<Vec<i64>> {
    output
        .bodies
        .iter()
        .map(|ops| {
            ops.windows(2)
                .filter_map(|w| match (&w[0], &w[1]) {
                    (Operator::I64Const { value }, Operator::Call { function_index: 0 }) => {
                        Some(*value)
                    }
                    _ => None,
                })
                .collect()
        })
        .collect()
}

#[test]
fn injection_shifts_every_function_reference() {
    let source = r#"
        (module
            (import "env" "a" (func $a))
            (import "env" "b" (func $b (param i32)))
            (table 4 funcref)
            (elem (i32.const 0) $a $f $g)
            (func $f)
            (func $g call $f)
            (func $h)
            (export "b" (func $b))
            (start $a))
    "#;
    let mut module = decode(&wasm(source)).unwrap();
    let mut injector = Injector::new(&module);
    let sig = FuncSig::new(&[ValueType::F32, ValueType::F32], Some(ValueType::F32));

    let logical = injector.add_import(&mut module, "_eosio_f32_add", &sig);

    assert_eq!(logical, 5);
    assert_eq!(injector.add_import(&mut module, "_eosio_f32_add", &sig), logical);
    assert_eq!(module.imports.len(), 3);
    assert_eq!(module.imports[0].module, INJECTED_NAMESPACE);
    assert_eq!(module.imports[0].name, "_eosio_f32_add");
    assert_eq!(module.exports[0].kind, ExportKind::Func);
    assert_eq!(module.exports[0].index, 2);
    assert_eq!(module.start, Some(1));
    assert_eq!(module.elements[0].functions, vec![1, 3, 4]);
    assert_eq!(injector.remap(logical), 0);
    assert_eq!(injector.remap(2), 3);
}

#[test]
fn calls_to_existing_functions_move_past_injected_imports() {
    let out = instrumented(
        r#"
        (module
            (import "env" "printi" (func $printi (param i64)))
            (func $twice (param f32) (result f32)
                local.get 0
                local.get 0
                f32.add)
            (func (export "apply") (param i64)
                f32.const 1.5
                call $twice
                drop
                local.get 0
                call $printi))
    "#,
    );
    let output = read_output(&out.wasm);

    assert_eq!(out.injected, 2);
    let imports: Vec<_> = output.imports.iter().map(|(m, n)| (m.as_str(), n.as_str())).collect();
    assert_eq!(
        imports,
        [
            (INJECTED_NAMESPACE, "use_gas"),
            (INJECTED_NAMESPACE, "_eosio_f32_add"),
            ("env", "printi"),
        ]
    );
    let calls: Vec<u32> = output.bodies[1]
        .iter()
        .filter_map(|op| match op {
            Operator::Call { function_index } => Some(*function_index),
            _ => None,
        })
        .collect();
    // $twice moved from 1 to 3, $printi from 0 to 2, then the charge.
    assert_eq!(calls, vec![3, 2, 0]);
    assert_eq!(out.module.export_func("apply"), Some(4));
}

#[test]
fn no_native_float_arithmetic_survives() {
    let out = instrumented(
        r#"
        (module
            (memory 1)
            (func (export "math") (param f64 f32 i32 i64) (result f64)
                local.get 0
                f64.sqrt
                local.get 1
                f64.promote_f32
                f64.div
                local.get 2
                f64.convert_i32_u
                f64.lt
                f64.convert_i32_s
                local.get 3
                f32.convert_i64_s
                f32.ceil
                i32.trunc_f32_s
                f32.convert_i32_u
                f32.neg
                f32.abs
                f64.promote_f32
                f64.min
                i32.const 0
                f64.load
                f64.copysign
                f64.const 2.0
                f64.mul
                i32.const 8
                f32.load
                i64.trunc_f32_u
                f64.convert_i64_u
                f64.max
                f32.demote_f64
                i32.reinterpret_f32
                f32.reinterpret_i32
                f64.promote_f32))
    "#,
    );
    let output = read_output(&out.wasm);

    let module = decode(&out.wasm).unwrap();
    for function in &module.functions {
        for instr in &function.body {
            assert!(!is_float_op(instr.opcode()), "float opcode 0x{:02x} left", instr.opcode());
        }
    }
    let ops = &output.bodies[0];
    assert!(ops.iter().any(|op| matches!(op, Operator::F64Load { .. })));
    assert!(ops.iter().any(|op| matches!(op, Operator::F64Const { .. })));
    assert!(ops.iter().any(|op| matches!(op, Operator::F32ReinterpretI32)));

    // Every replacement resolves to an injected software-float import.
    let resolved = gasket::intrinsics::Resolver::new().link(&module).unwrap();
    assert!(resolved.iter().all(|i| i.module == INJECTED_NAMESPACE));
    assert!(resolved.iter().any(|i| i.name == "_eosio_f64_sqrt"));
    assert!(resolved.iter().any(|i| i.name == "_eosio_f32_trunc_i32s"));
    assert!(resolved.iter().any(|i| i.name == "_eosio_ui64_to_f64"));
}

#[test]
fn straight_line_run_is_charged_once_in_full() {
    let source = r#"
        (module
            (func (param i32 i32) (result i32)
                local.get 0
                local.get 1
                i32.mul
                local.get 0
                i32.div_u
                i32.popcnt))
    "#;
    let original = decode(&wasm(source)).unwrap();
    let expected: u64 = original.functions[0].body.iter().map(|i| gas::cost(i.opcode())).sum();
    let out = instrumented(source);
    let output = read_output(&out.wasm);

    assert_eq!(charges(&output), vec![vec![expected as i64]]);
    assert_eq!(expected, 3 + 3 + 3 + 3 + 80 + 105);
}

#[test]
fn every_instruction_is_charged_exactly_once() {
    let source = r#"
        (module
            (func (param i32) (result i32) (local i32)
                block
                    loop
                        local.get 0
                        i32.eqz
                        br_if 1
                        local.get 1
                        local.get 0
                        i32.add
                        local.set 1
                        local.get 0
                        i32.const 1
                        i32.sub
                        local.set 0
                        br 0
                    end
                end
                local.get 0
                if
                    nop
                else
                    nop
                    nop
                end
                local.get 1
                return))
    "#;
    let original = decode(&wasm(source)).unwrap();
    let total: u64 = original.functions[0].body.iter().map(|i| gas::cost(i.opcode())).sum();
    let out = instrumented(source);
    let output = read_output(&out.wasm);

    let charged = &charges(&output)[0];
    assert_eq!(charged.iter().sum::<i64>() as u64, total);
    assert!(charged.iter().all(|&c| c > 0));
    assert!(charged.len() >= 5);
}

#[test]
fn charge_sits_right_before_its_boundary() {
    let out = instrumented(
        r#"
        (module
            (func (param i32)
                local.get 0
                br_if 0
                nop))
    "#,
    );
    let output = read_output(&out.wasm);

    let ops = &output.bodies[0];
    let br_if = ops.iter().position(|op| matches!(op, Operator::BrIf { .. })).unwrap();
    assert!(matches!(ops[br_if - 2], Operator::I64Const { value: 6 }));
    assert!(matches!(ops[br_if - 1], Operator::Call { function_index: 0 }));
    assert_eq!(charges(&output), vec![vec![6, 1]]);
}

#[test]
fn memory_maximum_is_clamped() {
    let options = InstrumentOptions { max_memory_pages: 8 };

    let out = instrument(&wasm("(module (memory 2 100))"), &options).unwrap();
    assert_eq!(out.memory_pages(), (2, 8));

    let out = instrument(&wasm("(module (memory 1))"), &options).unwrap();
    assert_eq!(out.memory_pages(), (1, 8));

    let out = instrument(&wasm("(module (memory 1 4))"), &options).unwrap();
    assert_eq!(out.memory_pages(), (1, 4));

    let err = instrument(&wasm("(module (memory 9))"), &options).unwrap_err();
    assert!(matches!(err, Error::Runtime(_)));
}

#[test]
fn data_segments_form_the_initial_image() {
    let out = instrument(
        &wasm(r#"(module (memory 1) (data (i32.const 4) "ab") (data (i32.const 1) "z"))"#),
        &InstrumentOptions::default(),
    )
    .unwrap();
    assert_eq!(out.image, b"\0z\0\0ab");

    let err = instrument(
        &wasm(r#"(module (memory 1) (data (i32.const 65535) "ab"))"#),
        &InstrumentOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        Error::Runtime("data segment outside of valid memory range".into())
    );
}

#[test]
fn malformed_and_post_mvp_modules_are_rejected() {
    let garbage = instrument(b"\0asm\x01\0\0\0\x99", &InstrumentOptions::default());
    assert!(matches!(garbage, Err(Error::Serialization(_))));

    let simd = wasm(r#"(module (func (result v128) v128.const i64x2 0 0))"#);
    assert!(matches!(
        instrument(&simd, &InstrumentOptions::default()),
        Err(Error::Serialization(_))
    ));
}
