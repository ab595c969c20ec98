//! # V2X Pipeline Benchmarks
//!
//! Per-stage cost as the vehicle count grows:
//!
//! | Stage | Operation | Scaling |
//! |-------|-----------|---------|
//! | vx-02 Perception | class-aware detections | O(n) |
//! | vx-03 Tracking | ByteTrack update | O(n · m) IoU + assignment |
//! | vx-03 Tracking | linear assignment | O(n³) worst case |
//! | vx-04 Digital Twin | link building | O(n²) pairs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use shared_types::SimulationFrame;
use v2x_tests::fixtures::random_vehicles;
use vx_02_perception::{DetectionApi, DetectionService, PerceptionConfig};
use vx_03_tracking::domain::{iou_distance, linear_assignment, ByteTracker};
use vx_03_tracking::TrackerConfig;
use vx_04_digital_twin::domain::{build_links, VehicleNode};

const SIZES: [usize; 4] = [10, 50, 200, 500];
const AREA_M: f64 = 1000.0;

fn frame(count: usize, seed: u64) -> SimulationFrame {
    SimulationFrame::new(0, 0.1, random_vehicles(count, AREA_M, seed))
}

// ============================================================================
// vx-02: Perception
// ============================================================================

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("vx-02-perception");

    for size in SIZES {
        let frame = frame(size, 7);
        let mut service = DetectionService::new(PerceptionConfig::default()).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("detect", size), &frame, |b, frame| {
            b.iter(|| black_box(service.detect(frame).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// vx-03: Tracking
// ============================================================================

fn bench_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("vx-03-tracking");
    group.measurement_time(Duration::from_secs(10));

    for size in SIZES {
        let mut service = DetectionService::new(PerceptionConfig::default()).unwrap();
        let first = service.detect(&frame(size, 11)).unwrap();
        let second = service.detect(&frame(size, 12)).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("byte_tracker_update", size),
            &(first, second),
            |b, (first, second)| {
                b.iter(|| {
                    let mut tracker = ByteTracker::new(TrackerConfig::default());
                    tracker.update(first);
                    black_box(tracker.update(second))
                })
            },
        );

        let boxes_a = boxes(&mut service, size, 21);
        let boxes_b = boxes(&mut service, size, 22);
        let cols = boxes_b.len();
        let cost = iou_distance(&boxes_a, &boxes_b);
        group.bench_with_input(
            BenchmarkId::new("linear_assignment", size),
            &cost,
            |b, cost| b.iter(|| black_box(linear_assignment(cost, cols, 0.8))),
        );
    }
    group.finish();
}

fn boxes(
    service: &mut DetectionService,
    size: usize,
    seed: u64,
) -> Vec<shared_types::BoundingBox> {
    service
        .detect(&frame(size, seed))
        .unwrap()
        .into_iter()
        .map(|d| d.bbox)
        .collect()
}

// ============================================================================
// vx-04: Digital Twin
// ============================================================================

fn bench_links(c: &mut Criterion) {
    let mut group = c.benchmark_group("vx-04-digital-twin");

    for size in SIZES {
        let nodes: Vec<VehicleNode> = random_vehicles(size, AREA_M, 3)
            .iter()
            .map(|v| VehicleNode::observe(v, 0))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build_links", size), &nodes, |b, nodes| {
            b.iter(|| black_box(build_links(nodes, 100.0)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detection, bench_tracking, bench_links);
criterion_main!(benches);
