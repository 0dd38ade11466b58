//! Reverb Performance Benchmarks
//!
//! Measures full-engine and FDN-core block processing cost.
//! Target: well under real time for a 512-sample stereo block @ 48kHz.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use umbra_core::Algorithm;
use umbra_dsp::engine::ReverbEngine;
use umbra_dsp::fdn::FdnCore;

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

/// Generate test audio (440Hz sine wave)
fn generate_test_audio(samples: usize) -> Vec<f64> {
    (0..samples)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reverb Engine");

    for algorithm in [Algorithm::Hall, Algorithm::Room, Algorithm::Ambient] {
        for &block_size in BLOCK_SIZES {
            group.bench_with_input(
                BenchmarkId::new(format!("{algorithm:?}"), block_size),
                &block_size,
                |b, &size| {
                    let mut engine = ReverbEngine::new();
                    engine
                        .prepare(SAMPLE_RATE, size)
                        .expect("valid prepare inputs");
                    engine.set_algorithm(algorithm);
                    engine.set_mix(1.0);

                    let mut left = generate_test_audio(size);
                    let mut right = generate_test_audio(size);

                    b.iter(|| {
                        engine.process(black_box(&mut left), black_box(&mut right));
                        black_box(left[0])
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_fdn_core(c: &mut Criterion) {
    let mut group = c.benchmark_group("FDN Core");

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(
            BenchmarkId::new("16-line", block_size),
            &block_size,
            |b, &size| {
                let mut fdn = FdnCore::new(SAMPLE_RATE);
                fdn.set_decay_time(3.0);
                fdn.set_mod_depth(0.4);
                let input = generate_test_audio(size);

                b.iter(|| {
                    let mut sum = 0.0;
                    for &sample in &input {
                        let (l, r) = fdn.process_sample(black_box(sample), black_box(-sample));
                        sum += l + r;
                    }
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_engine, bench_fdn_core);
criterion_main!(benches);
