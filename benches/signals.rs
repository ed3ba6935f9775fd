use criterion::{black_box, criterion_group, criterion_main, Criterion};
use driver_safety::capture::{Camera, CaptureConfig, SyntheticCamera};
use driver_safety::detection::{
    average_ear, BinaryFeatureDetector, BruteForceMatcher, DescriptorMatcher, FeatureDetector,
    Landmark, LandmarkSet, LEFT_EYE, RIGHT_EYE,
};

fn face() -> LandmarkSet {
    let mut set = LandmarkSet::default();
    for (eye, cx) in [(LEFT_EYE, 0.35), (RIGHT_EYE, 0.65)] {
        for (i, &index) in eye.indices.iter().enumerate() {
            let angle = std::f64::consts::TAU * i as f64 / 16.0;
            set.set(index, Landmark::new(cx + 0.05 * angle.cos(), 0.5 + 0.02 * angle.sin()));
        }
    }
    set
}

fn bench_ear(c: &mut Criterion) {
    let set = face();
    c.bench_function("average_ear", |b| b.iter(|| average_ear(black_box(&set))));
}

fn bench_features(c: &mut Criterion) {
    let mut camera = SyntheticCamera::new();
    camera.open(&CaptureConfig::default()).unwrap();
    let first = camera.capture().unwrap().unwrap();
    let second = camera.capture().unwrap().unwrap();

    let detector = BinaryFeatureDetector::new();
    c.bench_function("detect_and_describe_640x480", |b| {
        b.iter(|| detector.detect_and_describe(black_box(&first)).unwrap())
    });

    let a = detector.detect_and_describe(&first).unwrap();
    let b_features = detector.detect_and_describe(&second).unwrap();
    let matcher = BruteForceMatcher::default();
    c.bench_function("cross_check_match", |b| {
        b.iter(|| {
            matcher.match_descriptors(
                black_box(&a.descriptors),
                black_box(&b_features.descriptors),
            )
        })
    });
}

criterion_group!(benches, bench_ear, bench_features);
criterion_main!(benches);
