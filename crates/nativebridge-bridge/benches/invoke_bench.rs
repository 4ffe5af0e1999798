// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the invoke hot path: binding cache hit, argument
// checks, marshaling and the boundary crossing itself.

use std::ffi::{CStr, c_char, c_void};
use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use nativebridge_bridge::{BridgeAdapter, BridgeFunction};
use nativebridge_core::{ModuleName, Value};
use nativebridge_loader::{ModuleRegistry, StaticModule, StaticOpener};

const MANIFEST: &CStr = c"i64 add(i64, i64)\ndouble mix(i32, double)\n";

extern "C" fn manifest() -> *const c_char {
    MANIFEST.as_ptr()
}

extern "C" fn add(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

extern "C" fn mix(a: i32, b: f64) -> f64 {
    f64::from(a) * b
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn adapter() -> BridgeAdapter {
    let native_lib = StaticModule::new(ModuleName::new("native-lib").unwrap())
        .with_symbol(
            native_lib::STRING_FROM_NATIVE,
            native_lib::string_from_native as *const c_void,
        )
        .with_symbol(
            native_lib::FREE_TEXT,
            native_lib::nativebridge_free_text as *const c_void,
        )
        .with_symbol(
            "nativebridge_manifest",
            native_lib::nativebridge_manifest as *const c_void,
        );
    let arith = StaticModule::new(ModuleName::new("arith").unwrap())
        .with_symbol("nativebridge_manifest", manifest as *const c_void)
        .with_symbol("add", add as *const c_void)
        .with_symbol("mix", mix as *const c_void);

    let opener = StaticOpener::new().with_module(native_lib).with_module(arith);
    let registry = Arc::new(ModuleRegistry::new(Arc::new(opener)));
    registry.ensure_loaded("native-lib").expect("native-lib loads");
    registry.ensure_loaded("arith").expect("arith loads");
    BridgeAdapter::new(registry)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// The example call: allocate, copy into a `String`, release.
fn bench_invoke_text(c: &mut Criterion) {
    let adapter = adapter();
    let f = BridgeFunction::declare("native-lib", "text string_from_native()")
        .and_then(|f| f.releasing_text_with("nativebridge_free_text"))
        .expect("valid declaration");
    adapter.invoke_text(&f).expect("first call binds");

    c.bench_function("invoke_text string_from_native", |b| {
        b.iter(|| black_box(adapter.invoke_text(black_box(&f)).expect("invoke")));
    });
}

/// Two integer arguments and an integer return; no allocation on either side.
fn bench_invoke_integers(c: &mut Criterion) {
    let adapter = adapter();
    let f = BridgeFunction::declare("arith", "i64 add(i64, i64)").expect("valid declaration");
    let args = [Value::I64(40), Value::I64(2)];

    c.bench_function("invoke i64 add(i64, i64)", |b| {
        b.iter(|| black_box(adapter.invoke(&f, black_box(&args)).expect("invoke")));
    });
}

/// Mixed register classes.
fn bench_invoke_mixed(c: &mut Criterion) {
    let adapter = adapter();
    let f = BridgeFunction::declare("arith", "f64 mix(i32, f64)").expect("valid declaration");
    let args = [Value::I32(3), Value::F64(0.5)];

    c.bench_function("invoke f64 mix(i32, f64)", |b| {
        b.iter(|| black_box(adapter.invoke(&f, black_box(&args)).expect("invoke")));
    });
}

criterion_group!(
    benches,
    bench_invoke_text,
    bench_invoke_integers,
    bench_invoke_mixed
);
criterion_main!(benches);
