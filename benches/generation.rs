//! Generation performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vecgen_codegen::{ArtifactKind, Generator, MasterTemplate, Pipeline, Synthesizer};
use vecgen_profiles::Registry;

const INTERFACE: &str = include_str!("../templates/VectorD.h");
const IMPLEMENTATION: &str = include_str!("../templates/VectorD.cpp");

fn master(registry: &Registry) -> MasterTemplate {
    MasterTemplate::from_sources(registry.canonical(), INTERFACE, IMPLEMENTATION)
        .expect("canonical templates should load")
}

fn benchmark_template_loading(c: &mut Criterion) {
    let registry = Registry::builtin().expect("built-in registry should be valid");

    c.bench_function("load_master_template", |b| {
        b.iter(|| black_box(master(&registry).sections().arities().len()));
    });
}

fn benchmark_pipelines(c: &mut Criterion) {
    let registry = Registry::builtin().expect("built-in registry should be valid");
    let master = master(&registry);

    let mut group = c.benchmark_group("pipeline");

    // One profile per category
    for tag in ["f", "b", "ui8", "Wc"] {
        let profile = registry.lookup(tag).expect("profile should exist");
        group.bench_with_input(BenchmarkId::from_parameter(tag), &profile, |b, profile| {
            b.iter(|| {
                let pipeline = Pipeline::new(registry.canonical(), profile, true)
                    .expect("pipeline should build");
                let header = pipeline
                    .run(ArtifactKind::Interface, master.interface())
                    .expect("interface should render");
                let source = pipeline
                    .run(ArtifactKind::Implementation, master.implementation())
                    .expect("implementation should render");
                black_box(header.len() + source.len())
            });
        });
    }
    group.finish();
}

fn benchmark_synthesis(c: &mut Criterion) {
    let registry = Registry::builtin().expect("built-in registry should be valid");
    let master = master(&registry);

    c.bench_function("synthesize_generic_header", |b| {
        b.iter(|| {
            let header = Synthesizer::new(registry.canonical(), &master)
                .synthesize()
                .expect("synthesis should succeed");
            black_box(header.contents.len())
        });
    });
}

fn benchmark_end_to_end(c: &mut Criterion) {
    let registry = Registry::builtin().expect("built-in registry should be valid");
    let generator = Generator::new(registry.clone(), master(&registry), true);

    let mut group = c.benchmark_group("end_to_end");
    group.sample_size(20);

    group.bench_function("render_all", |b| {
        b.iter(|| {
            let outputs = generator.render().expect("render should succeed");
            black_box(outputs.len())
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_template_loading,
    benchmark_pipelines,
    benchmark_synthesis,
    benchmark_end_to_end
);

criterion_main!(benches);
