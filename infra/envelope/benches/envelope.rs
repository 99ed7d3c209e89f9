use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::sync::Arc;
use svault_domain::{AuthContext, CipherStrategy, KeyPolicy, KeyTag};
use svault_envelope::{EntryDigest, EnvelopeEngine};
use svault_keystore::{HardwareKeyStore, SoftwareKeyStore};
use tokio::time::Instant;

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    let sizes = [("64B", 64usize), ("1KB", 1024), ("16KB", 16 * 1024)];

    for strategy in [CipherStrategy::Symmetric, CipherStrategy::Asymmetric] {
        let hw = Arc::new(SoftwareKeyStore::new(strategy));
        let ctx = AuthContext::new(1, Instant::now());
        let key = hw.generate(&KeyTag::new("bench", KeyPolicy::Standard), &ctx).unwrap();
        let engine = EnvelopeEngine::new(hw);
        let entry = EntryDigest::new(&[9u8; 32], "bench-entry");
        let label = format!("{strategy:?}").to_lowercase();

        for (size_label, size) in sizes {
            let mut data = vec![0u8; size];
            getrandom::fill(&mut data).expect("System RNG unavailable for benchmark data");
            group.throughput(Throughput::Bytes(size as u64));

            group.bench_with_input(
                BenchmarkId::new(format!("encrypt_{label}"), size_label),
                &data,
                |b, d| b.iter(|| engine.encrypt(&entry, b"pw", d, &key, &ctx).unwrap()),
            );

            let record = engine.encrypt(&entry, b"pw", &data, &key, &ctx).unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("decrypt_{label}"), size_label),
                &record,
                |b, r| b.iter(|| engine.decrypt(&entry, b"pw", r, &key, &ctx).unwrap()),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_envelope);
criterion_main!(benches);
