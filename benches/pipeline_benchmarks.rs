//! Performance benchmarks for the FOOL pipeline.
//!
//! - compile: linking, type checking and code generation of generated trees
//! - run: executing assembled code on the machine
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fool::ast::{Decl, Program, Type};
use fool::{AstBuilder, Session};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut timings: std::collections::HashMap<String, i64> = Default::default();
    let mut frames = 0i64;
    for frame in view.recent_frames() {
        frames += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            let Ok(scopes) = Reader::from_start(&stream_info.stream).read_top_scopes() else {
                continue;
            };
            for scope in scopes {
                if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                    *timings.entry(details.name().to_string()).or_insert(0) +=
                        scope.record.duration_ns;
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({frames} frames) ===");
    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg = if frames > 0 { ns / frames } else { ns };
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos(avg as u64)
        );
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

/// `let fact(n) = ... in print(fact(n))`
fn factorial<'ast>(b: &AstBuilder<'ast>, n: i32) -> &'ast Program<'ast> {
    let fact = b.fun(
        "fact",
        vec![b.param("n", Type::Int)],
        Type::Int,
        &[],
        b.if_else(
            b.le(b.id("n"), b.int(1)),
            b.int(1),
            b.mul(b.id("n"), b.call("fact", &[b.sub(b.id("n"), b.int(1))])),
        ),
    );
    b.program(&[fact], b.print(b.call("fact", &[b.int(n)])))
}

/// `count` variables, each summing the previous one with a constant.
fn variable_chain<'ast>(b: &AstBuilder<'ast>, count: usize) -> &'ast Program<'ast> {
    let names: Vec<String> = (0..count).map(|i| format!("v{i}")).collect();
    let mut decls: Vec<Decl<'ast>> = vec![b.var("v0", Type::Int, b.int(0))];
    for window in names.windows(2) {
        decls.push(b.var(&window[1], Type::Int, b.add(b.id(&window[0]), b.int(1))));
    }
    b.program(&decls, b.print(b.id(&names[count - 1])))
}

/// A class hierarchy `depth` levels deep, each level overriding `get`.
fn class_chain<'ast>(b: &AstBuilder<'ast>, depth: usize) -> &'ast Program<'ast> {
    let mut decls = Vec::new();
    for level in 0..depth {
        let name = format!("C{level}");
        let parent = (level > 0).then(|| format!("C{}", level - 1));
        decls.push(b.class(
            &name,
            parent.as_deref(),
            vec![],
            vec![b.method("get", vec![], Type::Int, &[], b.int(level as i32))],
        ));
    }
    let last = format!("C{}", depth - 1);
    decls.push(b.var("o", b.class_ref("C0"), b.new_object(&last, &[])));
    b.program(&decls, b.print(b.method_call("o", "get", &[])))
}

fn compile_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let session = Session::default();
    let mut group = c.benchmark_group("pipeline/compile");

    for count in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("variables", count), &count, |bench, &count| {
            bench.iter(|| {
                let arena = Bump::new();
                let b = AstBuilder::new(&arena);
                let program = variable_chain(&b, count);
                let compiled = session.compile(&arena, black_box(program));
                end_profiling_frame();
                black_box(compiled.map(|c| c.code.len()).ok())
            });
        });
    }

    for depth in [4usize, 32, 128] {
        group.bench_with_input(BenchmarkId::new("classes", depth), &depth, |bench, &depth| {
            bench.iter(|| {
                let arena = Bump::new();
                let b = AstBuilder::new(&arena);
                let program = class_chain(&b, depth);
                black_box(session.compile(&arena, black_box(program)).is_ok())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

fn run_benchmarks(c: &mut Criterion) {
    let session = Session::default();
    let mut group = c.benchmark_group("pipeline/run");

    for n in [5, 10, 12] {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let Ok(compiled) = session.compile(&arena, factorial(&b, n)) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("factorial", n), &compiled.code, |bench, code| {
            bench.iter(|| black_box(session.run(black_box(code.clone()))));
        });
    }

    group.finish();
}

criterion_group!(benches, compile_benchmarks, run_benchmarks);
criterion_main!(benches);
