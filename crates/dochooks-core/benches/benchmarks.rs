//! Benchmarks for dochooks-core
//!
//! Run with: cargo bench -p dochooks-core --features generate
//!
//! Filter benchmarks:
//!   cargo bench -- "parsing"
//!   cargo bench -- "checks"

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use dochooks_core::check::{CheckConfig, CheckerKind, LinkProbe, chain_factory, check_document};
use dochooks_core::parse::parse_rst;
use dochooks_core::spacing::check_lines;
use std::sync::Arc;

use fixtures::{document_path, fixtures};

/// Benchmark parsing across all fixture sizes
fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    let source = document_path();

    for (name, content) in fixtures() {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_rst", name), content, |b, input| {
            b.iter(|| parse_rst(std::hint::black_box(input), &source))
        });
    }
    group.finish();
}

/// Benchmark each checker on its own, then the full chain
fn bench_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("checks");
    let source = document_path();
    let config = Arc::new(CheckConfig::new().with_check_external_links(false));

    for (name, content) in fixtures() {
        let document = parse_rst(content, &source).expect("generated documents parse");

        for kind in CheckerKind::all() {
            group.bench_with_input(BenchmarkId::new(kind.name(), name), &document, |b, doc| {
                b.iter(|| {
                    // A fresh probe per iteration so link lookups are not memoized away
                    let factory = kind.factory(config.clone(), Arc::new(LinkProbe::offline()));
                    check_document(&factory, std::hint::black_box(doc))
                })
            });
        }

        group.bench_with_input(BenchmarkId::new("chained", name), &document, |b, doc| {
            b.iter(|| {
                let factory = chain_factory(
                    &CheckerKind::all(),
                    false,
                    config.clone(),
                    Arc::new(LinkProbe::offline()),
                );
                check_document(&factory, std::hint::black_box(doc))
            })
        });
    }
    group.finish();
}

/// Benchmark the CJK/Latin spacing scan
fn bench_spacing(c: &mut Criterion) {
    let mut group = c.benchmark_group("spacing");

    for (name, content) in fixtures() {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("check_lines", name), content, |b, input| {
            b.iter(|| check_lines(std::hint::black_box(input).lines()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parsing, bench_checks, bench_spacing);
criterion_main!(benches);
