use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::prelude::*;
use tempfile::TempDir;
use unikv::{MarshalFormat, Options, Store};

pub fn benchmark(c: &mut Criterion) {
    let mut rng = thread_rng();

    macro_rules! get_key {
        () => {
            format!("key{}", rng.gen_range(0, 100))
        };
    }

    macro_rules! get_value {
        () => {
            "v".repeat(rng.gen_range(1, 100000))
        };
    }

    macro_rules! open {
        ($options:expr, $format:expr) => {{
            let temp_dir = TempDir::new().unwrap();
            let options = match $options {
                "sled" => Options::sled(temp_dir.path().join("sled.db")),
                _ => Options::memory(),
            };
            let store = Store::open(options.with_format($format)).unwrap();
            (temp_dir, store)
        }};
    }

    macro_rules! bench_write {
        ($engine:expr, $format:expr) => {
            let mut group = c.benchmark_group("write");
            let (_temp_dir, store) = open!($engine, $format);
            group.bench_function(BenchmarkId::new($engine, $format), |b| {
                b.iter_batched(
                    || (get_key!(), get_value!()),
                    |(key, value)| store.set(&key, &value).unwrap(),
                    BatchSize::SmallInput,
                )
            });
            group.finish();
        };
    }

    macro_rules! bench_read {
        ($engine:expr, $format:expr) => {
            let mut group = c.benchmark_group("read");
            let (_temp_dir, store) = open!($engine, $format);
            (0..100).for_each(|i| {
                store.set(&format!("key{}", i), &get_value!()).unwrap();
            });
            group.bench_function(BenchmarkId::new($engine, $format), |b| {
                b.iter_batched(
                    || get_key!(),
                    |key| store.get::<String>(&key).unwrap(),
                    BatchSize::SmallInput,
                )
            });
            group.finish();
        };
    }

    for &format in &[MarshalFormat::Json, MarshalFormat::Bincode] {
        bench_write!("memory", format);
        bench_write!("sled", format);
        bench_read!("memory", format);
        bench_read!("sled", format);
    }
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
