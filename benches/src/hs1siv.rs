//! HS1-SIV benchmarks.
use criterion::{criterion_group, criterion_main, BenchmarkId, Throughput};
use hs1siv::{hazmat, Hs1Siv};

mod utils;
use utils::{config, implementations, Benchmarker, SIZES};

const KEY: [u8; 32] = [0x42; 32];
const NONCE: [u8; 12] = [0x24; 12];

fn bench_seal(c: &mut Benchmarker) {
    let mut group = c.benchmark_group("seal");

    for implementation in implementations() {
        let cipher = Hs1Siv::with_implementation(&KEY, implementation);

        for &size in SIZES {
            let mut buf = vec![0u8; size];
            group.throughput(Throughput::Bytes(size as u64));

            group.bench_function(BenchmarkId::new(implementation.name(), size), |b| {
                b.iter(|| cipher.seal_in_place(&NONCE, &[], &mut buf));
            });
        }
    }

    group.finish();
}

fn bench_open(c: &mut Benchmarker) {
    let mut group = c.benchmark_group("open");

    for implementation in implementations() {
        let cipher = Hs1Siv::with_implementation(&KEY, implementation);

        for &size in SIZES {
            let mut ciphertext = Vec::new();
            cipher.seal(&mut ciphertext, &NONCE, &vec![0u8; size], &[]);
            group.throughput(Throughput::Bytes(size as u64));

            group.bench_function(BenchmarkId::new(implementation.name(), size), |b| {
                let mut plaintext = Vec::with_capacity(size);
                b.iter(|| {
                    plaintext.clear();
                    cipher.open(&mut plaintext, &NONCE, &ciphertext, &[])
                });
            });
        }
    }

    group.finish();
}

fn bench_primitives(c: &mut Benchmarker) {
    let mut group = c.benchmark_group("primitives");
    let hash_key = hazmat::HashKey::from_aead_key(&KEY);

    for implementation in implementations() {
        for &size in SIZES {
            let mut buf = vec![0u8; size];
            group.throughput(Throughput::Bytes(size as u64));

            group.bench_function(
                BenchmarkId::new(format!("chacha20/{}", implementation.name()), size),
                |b| b.iter(|| hazmat::chacha20_xor(implementation, &KEY, &NONCE, 0, &mut buf)),
            );

            let blocks = size - size % hazmat::NH_LEN;
            group.bench_function(
                BenchmarkId::new(format!("hash_step/{}", implementation.name()), size),
                |b| {
                    let mut accum = [1u64; hazmat::HASH_ROUNDS];
                    b.iter(|| hazmat::hash_step(implementation, &hash_key, &buf[..blocks], &mut accum));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = config();
    targets = bench_seal, bench_open, bench_primitives
);

criterion_main!(benches);
