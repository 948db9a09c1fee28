use RustedMMS::codegen::lua_serializer::LuaDialect;
use RustedMMS::mms::manufactured_field::FieldCoefficients;
use RustedMMS::mms::residuals::ManufacturedSolution;
use RustedMMS::mms::spalart_allmaras::SaOptions;
use RustedMMS::mms::thermo::GasModel;
use RustedMMS::study::tasks::source_terms_task;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_derive(c: &mut Criterion) {
    let coefficients = FieldCoefficients::default();
    let gas = GasModel::default();
    let options = SaOptions::default();
    let mut group = c.benchmark_group("residuals");
    group.sample_size(10);
    group.bench_function("derive source terms", |b| {
        b.iter(|| ManufacturedSolution::derive(black_box(&coefficients), &gas, &options))
    });
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let corrected = SaOptions {
        negative_shat_correction: true,
        ..SaOptions::default()
    };
    let solution = ManufacturedSolution::derive(&FieldCoefficients::default(), &GasModel::default(), &corrected);
    let task = source_terms_task(&solution);
    let dialect = LuaDialect::default();
    let mut group = c.benchmark_group("codegen");
    group.sample_size(10);
    group.bench_function("serialize source terms", |b| {
        b.iter(|| task.generate(black_box(&dialect)))
    });
    group.finish();
}

criterion_group!(benches, bench_derive, bench_serialize);
criterion_main!(benches);
