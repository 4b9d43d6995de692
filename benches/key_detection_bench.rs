//! Performance benchmarks for streaming key detection

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keytrack::{DetectorConfig, KeyDetector, KeyMethod};

/// C major triad, one block at 44.1 kHz
fn chord_block(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 / 44100.0;
            [261.63, 329.63, 392.00]
                .iter()
                .map(|f| (2.0 * std::f64::consts::PI * f * t).sin())
                .sum::<f64>()
                / 6.0
        })
        .collect()
}

fn bench_process_block(c: &mut Criterion) {
    for method in [KeyMethod::Progression, KeyMethod::Profile] {
        let mut detector = KeyDetector::new(DetectorConfig::new(method, 44100.0))
            .expect("default config is valid");
        let block = chord_block(detector.block_size());

        c.bench_function(&format!("process_block_{}", method), |b| {
            b.iter(|| detector.process(black_box(&block)))
        });
    }
}

fn bench_construction(c: &mut Criterion) {
    c.bench_function("detector_new_44100", |b| {
        b.iter(|| KeyDetector::new(black_box(DetectorConfig::default())))
    });
}

criterion_group!(benches, bench_process_block, bench_construction);
criterion_main!(benches);
