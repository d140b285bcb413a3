//! Benchmarks for path composition and artifact lookup.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use suffixflow::context::PipelineContext;
use suffixflow::core::{ArtifactMatcher, PathAddress};

fn address_benchmark(c: &mut Criterion) {
    let address = PathAddress::new("data", "tmp", ".bwa.sort.chr6");
    c.bench_function("output_path", |b| {
        b.iter(|| black_box(address.output_path(black_box(".stat"), black_box("s1"))))
    });

    let ctx = PipelineContext::new("data", "tmp").with_suffix(".bwa.sort");
    c.bench_function("inherit", |b| b.iter(|| black_box(ctx.inherit(black_box(false)))));
}

fn matcher_benchmark(c: &mut Criterion) {
    let dir = std::env::temp_dir().join(format!("suffixflow-bench-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for i in 0..200 {
        std::fs::write(dir.join(format!("tmp.s{i}.bwa.bam")), b"").unwrap();
        std::fs::write(dir.join(format!("tmp.s{i}.bwa.bam.bai")), b"").unwrap();
    }
    let prefix = format!("{}/tmp.s100.bwa", dir.display());

    let dotted = ArtifactMatcher::DottedFamily;
    c.bench_function("dotted_family_200", |b| {
        b.iter(|| black_box(dotted.is_present(black_box(&prefix))))
    });

    let exts = ArtifactMatcher::extensions([".bam", ".bam.bai"]);
    c.bench_function("extensions_200", |b| {
        b.iter(|| black_box(exts.is_present(black_box(&prefix))))
    });

    std::fs::remove_dir_all(&dir).unwrap();
}

criterion_group!(benches, address_benchmark, matcher_benchmark);
criterion_main!(benches);
