use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pubpack::{serialize, to_bytes, values, PackOptions, Packer, Value};
use serde::Serialize;

#[derive(Serialize, Clone)]
struct Sample {
    channel: u8,
    level: f32,
    peak: f64,
}

fn benchmark_flat_format(c: &mut Criterion) {
    let values = values![1, 2.5, "hello", 65535, -3];

    c.bench_function("pack_flat_format", |b| {
        b.iter(|| serialize(black_box(&values), black_box("cftSi")))
    });
}

fn benchmark_repeat(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_repeat");

    for size in [10, 100, 1000, 10000].iter() {
        let values: Vec<Value> = (0..*size)
            .flat_map(|i| [Value::from(i % 128), Value::from(i as f64 * 0.5)])
            .collect();
        let packer = Packer::new(PackOptions::new().with_format("[cf]"));

        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| packer.pack(black_box(values)))
        });
    }

    group.finish();
}

fn benchmark_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_text");

    for size in [10, 100, 1000].iter() {
        let values: Vec<Value> = (0..*size)
            .map(|i| match i % 3 {
                0 => Value::from(i),
                1 => Value::from(i as f64 / 3.0),
                _ => Value::from(format!("symbol{}", i)),
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| serialize(black_box(values), "[t]"))
        });
    }

    group.finish();
}

fn benchmark_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("capacity_hint");
    let values: Vec<Value> = (0..256).map(Value::from).collect();

    for capacity in [0usize, 256, 65536].iter() {
        let packer = Packer::new(PackOptions::new().with_format("[C]").with_capacity(*capacity));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &values,
            |b, values| b.iter(|| packer.pack(black_box(values))),
        );
    }

    group.finish();
}

fn benchmark_serde_bridge(c: &mut Criterion) {
    let samples: Vec<Sample> = (0..100)
        .map(|i| Sample {
            channel: i as u8,
            level: i as f32 * 0.01,
            peak: i as f64 * 0.02,
        })
        .collect();

    c.bench_function("to_bytes_struct_list", |b| {
        b.iter(|| to_bytes(black_box(&samples), "[Cfd]"))
    });
}

criterion_group!(
    benches,
    benchmark_flat_format,
    benchmark_repeat,
    benchmark_text,
    benchmark_capacity,
    benchmark_serde_bridge
);
criterion_main!(benches);
