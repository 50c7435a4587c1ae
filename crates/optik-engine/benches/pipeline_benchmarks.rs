//! Per-frame pipeline benchmarks.
//!
//! The control loop runs at camera rate (30-60 fps), so a frame budget of a
//! few milliseconds is shared with detection. The pipeline itself should
//! stay in the low microseconds.
//!
//! ```bash
//! cargo bench -p optik-engine
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use optik_core::config::{ControlPoint, OptikConfig};
use optik_core::types::LandmarkFrame;
use optik_dictation::MockDictation;
use optik_engine::{Controller, Finger, GestureEngine, LandmarkNormalizer, SyntheticHand};
use optik_input::RecordingInput;

/// A hand sweeping left to right, pinching for a stretch in the middle.
fn sweep(frames: usize) -> Vec<LandmarkFrame> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / frames as f32;
            let hand = SyntheticHand::pointing().control_at(ControlPoint::IndexTip, 0.15 + 0.7 * t, 0.5);
            if (0.4..0.6).contains(&t) {
                hand.pinching(Finger::Index).frame()
            } else {
                hand.frame()
            }
        })
        .collect()
}

fn bench_normalizer(c: &mut Criterion) {
    let normalizer = LandmarkNormalizer::from_config(&OptikConfig::default());
    let frame = SyntheticHand::open_palm().frame();

    c.bench_function("normalize_frame", |b| {
        b.iter(|| normalizer.features(black_box(Some(&frame))))
    });
}

fn bench_engine(c: &mut Criterion) {
    let frames = sweep(240);
    let mut engine = GestureEngine::new(&OptikConfig::default()).expect("default config is valid");
    let mut i = 0usize;

    c.bench_function("engine_process_frame", |b| {
        b.iter(|| {
            let frame = &frames[i % frames.len()];
            i += 1;
            black_box(engine.process(Some(frame)).intents.len())
        })
    });
}

fn bench_controller(c: &mut Criterion) {
    let frames = sweep(240);
    let mut controller = Controller::new(
        &OptikConfig::default(),
        RecordingInput::new(),
        MockDictation::new(),
    )
    .expect("default config is valid");
    let mut i = 0usize;

    c.bench_function("controller_process_frame", |b| {
        b.iter(|| {
            let detection = std::slice::from_ref(&frames[i % frames.len()]);
            i += 1;
            if i % frames.len() == 0 {
                controller.input_mut().clear();
            }
            black_box(controller.process(detection).state)
        })
    });
}

criterion_group!(benches, bench_normalizer, bench_engine, bench_controller);
criterion_main!(benches);
