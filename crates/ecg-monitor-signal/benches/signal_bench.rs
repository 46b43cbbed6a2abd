//! Benchmarks for the streaming DSP path.
//!
//! Run with: cargo bench --package ecg-monitor-signal

use std::f64::consts::PI;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ecg_monitor_core::MonitorConfig;
use ecg_monitor_signal::{detect_peaks, FilterPipeline};

/// Synthetic ECG-like window: 72 BPM pulse train, 60 Hz interference,
/// slow baseline wander.
fn synthetic_window(config: &MonitorConfig) -> Vec<f64> {
    let fs = config.fs_hz;
    let n = config.window_len();
    let beat_period = 60.0 / 72.0;
    (0..n)
        .map(|i| {
            let t = i as f64 / fs;
            let phase = (t % beat_period) / beat_period;
            let qrs = if phase < 0.04 {
                (1.0 - (phase / 0.04 - 0.5).abs() * 2.0).max(0.0)
            } else {
                0.0
            };
            qrs + 0.15 * (2.0 * PI * 60.0 * t).sin() + 0.3 * (2.0 * PI * 0.3 * t).sin()
        })
        .collect()
}

fn bench_filter_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Filter Pipeline");
    group.measurement_time(Duration::from_secs(10));

    let config = MonitorConfig::default();
    let pipeline = FilterPipeline::new(&config);
    let window = synthetic_window(&config);

    group.throughput(Throughput::Elements(window.len() as u64));
    group.bench_function("full_window", |b| {
        b.iter(|| pipeline.apply(black_box(&window)));
    });

    group.finish();
}

fn bench_peak_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("Peak Detection");
    group.measurement_time(Duration::from_secs(5));

    let config = MonitorConfig::default();
    let pipeline = FilterPipeline::new(&config);
    let filtered = pipeline.apply(&synthetic_window(&config)).filtered;
    let min_distance = config.min_distance_samples();
    let smooth_window = config.smooth_window_samples();

    group.throughput(Throughput::Elements(filtered.len() as u64));
    group.bench_function("streaming_detector", |b| {
        b.iter(|| detect_peaks(black_box(&filtered), min_distance, smooth_window));
    });

    group.finish();
}

fn bench_filter_and_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("Full Tick DSP");
    group.measurement_time(Duration::from_secs(10));

    let config = MonitorConfig::default();
    let pipeline = FilterPipeline::new(&config);
    let window = synthetic_window(&config);
    let min_distance = config.min_distance_samples();
    let smooth_window = config.smooth_window_samples();

    group.throughput(Throughput::Elements(window.len() as u64));
    group.bench_function("filter_then_detect", |b| {
        b.iter(|| {
            let outcome = pipeline.apply(black_box(&window));
            detect_peaks(&outcome.filtered, min_distance, smooth_window)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_filter_pipeline,
    bench_peak_detection,
    bench_filter_and_detect,
);
criterion_main!(benches);
