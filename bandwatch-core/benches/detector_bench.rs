//! Criterion benchmarks for Bandwatch hot paths.
//!
//! Benchmarks:
//! 1. Bollinger band compute over a full history
//! 2. Batch crossing detection (fixed and adaptive offsets)
//! 3. Live bar arrival (append + tail band + classification)
//! 4. Buffer snapshot under growth

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use bandwatch_core::buffer::{IngestMode, SeriesBuffer};
use bandwatch_core::config::BandwatchConfig;
use bandwatch_core::data::SyntheticFeed;
use bandwatch_core::detector::{BandCrossingDetector, OffsetMode};
use bandwatch_core::domain::{closes, Bar};
use bandwatch_core::indicators::{BandIndicator, Bollinger};
use bandwatch_core::stream::StreamClient;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
    SyntheticFeed::new(start).generate("BENCH", start, n)
}

// ── 1. Indicator ─────────────────────────────────────────────────────

fn bench_bollinger(c: &mut Criterion) {
    let mut group = c.benchmark_group("bollinger");
    for n in [240usize, 1_440, 10_080] {
        let series = closes(&make_bars(n));
        let indicator = Bollinger::new(20, 2.0);
        group.bench_with_input(BenchmarkId::new("compute", n), &series, |b, s| {
            b.iter(|| indicator.compute(black_box(s)))
        });
    }
    group.finish();
}

// ── 2. Batch detection ───────────────────────────────────────────────

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");
    let series = closes(&make_bars(1_440));
    let band = Bollinger::new(20, 2.0).compute(&series);

    let fixed = BandCrossingDetector::new(OffsetMode::Fixed {
        upper: 0.002,
        lower: 0.002,
    });
    let adaptive = BandCrossingDetector::default();

    group.bench_function("fixed_1440", |b| {
        b.iter(|| fixed.detect(black_box(&series), black_box(&band)))
    });
    group.bench_function("adaptive_1440", |b| {
        b.iter(|| adaptive.detect(black_box(&series), black_box(&band)))
    });
    group.finish();
}

// ── 3. Live arrival ──────────────────────────────────────────────────

fn bench_live(c: &mut Criterion) {
    let mut group = c.benchmark_group("live");
    let bars = make_bars(1_240);
    let (history, live) = bars.split_at(240);
    let config = BandwatchConfig::classic();

    group.bench_function("on_bar_1000", |b| {
        b.iter(|| {
            let buffer = Arc::new(SeriesBuffer::new(IngestMode::Raw));
            let Ok(mut client) = StreamClient::new(buffer, &config) else {
                return;
            };
            client.start_stream("BENCH", history.to_vec()).ok();
            for bar in live {
                black_box(client.on_bar("BENCH", bar.clone()).ok());
            }
        })
    });
    group.finish();
}

// ── 4. Buffer ────────────────────────────────────────────────────────

fn bench_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer");
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap();
    let buffer = SeriesBuffer::new(IngestMode::Strict);
    let seed: Vec<Bar> = (0..10_000)
        .map(|i| Bar::new(start + Duration::minutes(i), 1.0, 1.0, 1.0, 1.0, 1.0))
        .collect();
    buffer.seed("BENCH", seed).ok();

    group.bench_function("snapshot_10000", |b| {
        b.iter(|| black_box(buffer.get("BENCH").ok()))
    });
    group.bench_function("closes_10000", |b| {
        b.iter(|| black_box(buffer.closes("BENCH").ok()))
    });
    group.finish();
}

criterion_group!(benches, bench_bollinger, bench_detect, bench_live, bench_buffer);
criterion_main!(benches);
