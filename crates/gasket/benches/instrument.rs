use criterion::{criterion_group, criterion_main, Criterion};
use gasket::{instrument, InstrumentOptions};
use std::hint::black_box;

const LOOP: &str = r#"
    (module
        (memory 1)
        (func $sum (param i32) (result i32) (local i32)
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
            local.get 1)
        (func (export "apply") (param i64)
            i32.const 100
            call $sum
            drop))
"#;

const FLOATS: &str = r#"
    (module
        (func (export "apply") (param i64)
            (local f64)
            local.get 0
            f64.convert_i64_s
            f64.sqrt
            f64.const 1.5
            f64.mul
            local.set 1
            local.get 1
            f32.demote_f64
            f32.ceil
            i32.trunc_f32_s
            drop))
"#;

fn instrument_loop_bench(c: &mut Criterion) {
    let wasm = wat::parse_str(LOOP).unwrap();
    let options = InstrumentOptions::default();
    c.bench_function("instrument integer loop", |b| {
        b.iter(|| instrument(black_box(&wasm), &options).unwrap())
    });
}

fn instrument_floats_bench(c: &mut Criterion) {
    let wasm = wat::parse_str(FLOATS).unwrap();
    let options = InstrumentOptions::default();
    c.bench_function("instrument float rewrite", |b| {
        b.iter(|| instrument(black_box(&wasm), &options).unwrap())
    });
}

// ─── Software floating point ─────────────────────────────────────────────────

fn softfloat_f64_bench(c: &mut Criterion) {
    c.bench_function("f64 div+sqrt software", |b| {
        b.iter(|| {
            gasket_runtime::ops::f64_sqrt(gasket_runtime::ops::f64_div(
                black_box(2.0),
                black_box(3.0),
            ))
        })
    });
}

fn native_f64_bench(c: &mut Criterion) {
    c.bench_function("f64 div+sqrt native", |b| {
        b.iter(|| (black_box(2.0f64) / black_box(3.0f64)).sqrt())
    });
}

criterion_group!(
    benches,
    instrument_loop_bench,
    instrument_floats_bench,
    softfloat_f64_bench,
    native_f64_bench
);
criterion_main!(benches);
