use criterion::{Criterion, criterion_group, criterion_main};
use envkeep::{EnvStore, EnvTable};

fn bench_store(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let env_path = dir.path().join(".env");
    std::fs::write(&env_path, make_env_content(500)).expect("failed to write bench file");

    let mut store = EnvStore::at(&env_path).env_table(EnvTable::memory());

    c.bench_function("assign_overwrite", |b| {
        b.iter(|| {
            store
                .assign("KEY_250", Some("updated"), true)
                .expect("assign should succeed")
        });
    });

    c.bench_function("assign_then_erase", |b| {
        b.iter(|| {
            store.assign("BENCH_TEMP", Some("value"), true);
            assert!(store.erase("BENCH_TEMP"));
        });
    });

    c.bench_function("resolve_from_file", |b| {
        b.iter(|| store.resolve("KEY_499", None).expect("key should resolve"));
    });
}

fn make_env_content(entries: usize) -> String {
    let mut content = String::with_capacity(entries * 16);
    for idx in 0..entries {
        content.push_str("KEY_");
        content.push_str(&idx.to_string());
        content.push('=');
        content.push_str("value");
        content.push('\n');
    }
    content
}

criterion_group!(benches, bench_store);
criterion_main!(benches);
