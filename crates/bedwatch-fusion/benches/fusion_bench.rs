//! Benchmarks for the per-frame hot paths.
//!
//! Everything here must comfortably fit a 33 ms frame budget; the
//! arbitration cycle itself should be microseconds.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bedwatch_core::{BoundingBox, Confidence, DepthFrame, Detection, RgbFrame, Timestamp};
use bedwatch_fusion::{
    ArbitrationConfig, ArbitrationEngine, CycleInput, MonitorConfig, MotionConfig, MotionEstimator,
    MotionState, PatientMonitor, Pose, SmoothedPose,
};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

fn rgb_frame(value: u8, millis: i64) -> RgbFrame {
    RgbFrame::new(
        vec![value; WIDTH * HEIGHT * 4],
        WIDTH,
        HEIGHT,
        Timestamp::from_millis(millis),
    )
    .unwrap()
}

fn depth_frame(depth_mm: u16, millis: i64) -> DepthFrame {
    DepthFrame::from_raw(
        vec![depth_mm; WIDTH * HEIGHT],
        WIDTH,
        HEIGHT,
        Timestamp::from_millis(millis),
    )
    .unwrap()
}

fn bench_motion_estimation(c: &mut Criterion) {
    let mut estimator = MotionEstimator::new(MotionConfig::default());
    estimator.analyze(&rgb_frame(0, 0));
    let frame = rgb_frame(128, 33);

    c.bench_function("motion_analyze_vga", |b| {
        b.iter(|| estimator.analyze(black_box(&frame)))
    });
}

fn bench_region_stats(c: &mut Criterion) {
    let mut analyzer = bedwatch_fusion::DepthAnalyzer::new(bedwatch_fusion::DepthConfig::default());
    analyzer.update_map(&depth_frame(2_000, 0));
    let bbox = BoundingBox::new(0.25, 0.25, 0.5, 0.5).unwrap();

    c.bench_function("depth_region_stats_quarter_vga", |b| {
        b.iter(|| analyzer.region_stats(black_box(&bbox)))
    });
}

fn bench_arbitration_cycle(c: &mut Criterion) {
    let mut engine = ArbitrationEngine::new(ArbitrationConfig::default());
    let mut millis = 0i64;

    c.bench_function("arbitration_evaluate", |b| {
        b.iter(|| {
            millis += 33;
            let now = Timestamp::from_millis(millis);
            let input = CycleInput {
                now,
                pose: SmoothedPose {
                    pose: Pose::Lying,
                    confidence: 0.8,
                    previous: Pose::Unknown,
                    held_for_ms: millis,
                },
                geometry_fall: false,
                fall: None,
                in_bed_zone: Some(true),
                bed_zone_excursion: Some(-0.6),
                motion: MotionState {
                    motion_level: 0.2,
                    is_still: false,
                    stillness_duration_ms: 0,
                    last_motion_at: now,
                },
                signals: &[],
            };
            engine.evaluate(black_box(&input))
        })
    });
}

fn bench_full_pipeline_cycle(c: &mut Criterion) {
    let mut monitor = PatientMonitor::new(MonitorConfig::default());
    let detection = Detection::new(
        BoundingBox::new(0.4, 0.3, 0.2, 0.5).unwrap(),
        0,
        Confidence::clamped(0.9),
        "person",
    );
    let mut millis = 0i64;

    c.bench_function("pipeline_sync_and_evaluate", |b| {
        b.iter(|| {
            millis += 33;
            monitor.ingest_rgb(rgb_frame(40, millis));
            let pair = monitor
                .ingest_depth(depth_frame(2_000, millis + 1))
                .expect("frames 1ms apart must pair");
            monitor.evaluate(black_box(&pair), &[detection.clone()], &[])
        })
    });
}

criterion_group!(
    benches,
    bench_motion_estimation,
    bench_region_stats,
    bench_arbitration_cycle,
    bench_full_pipeline_cycle
);
criterion_main!(benches);
