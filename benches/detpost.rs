use criterion::{criterion_group, criterion_main, Criterion};
use detpost::{DetectConfig, Detector, ImageSize, LabelTable, ModelSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const INPUT_SIZE: usize = 512;

fn make_tensor(rows: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(42);
    let s = INPUT_SIZE as f32;
    let mut data = Vec::with_capacity(rows * 6);
    for _ in 0..rows {
        let x = rng.random_range(0.0..s - 64.0);
        let y = rng.random_range(0.0..s - 64.0);
        let w = rng.random_range(8.0..64.0);
        let h = rng.random_range(8.0..64.0);
        data.extend_from_slice(&[
            x,
            y,
            x + w,
            y + h,
            rng.random::<f32>(),
            rng.random_range(0..80) as f32,
        ]);
    }
    data
}

fn bench_detector(c: &mut Criterion) {
    let raw = make_tensor(2000);
    let dest = ImageSize::new(1920, 1080).unwrap();
    let model = ModelSpec {
        input_size: INPUT_SIZE,
        num_classes: 80,
    };

    let default_det = Detector::new(model, LabelTable::coco()).unwrap();
    c.bench_function("detect_2000_default", |b| {
        b.iter(|| black_box(default_det.detect(raw.clone(), dest).unwrap()));
    });

    let wide_det = Detector::new(model, LabelTable::coco())
        .unwrap()
        .with_config(DetectConfig {
            min_score: 0.0,
            iou_threshold: 0.5,
            max_results: 2000,
            ..DetectConfig::default()
        })
        .unwrap();
    c.bench_function("detect_2000_uncapped", |b| {
        b.iter(|| black_box(wide_det.detect(raw.clone(), dest).unwrap()));
    });

    let par_det = Detector::new(model, LabelTable::coco())
        .unwrap()
        .with_config(DetectConfig {
            min_score: 0.0,
            iou_threshold: 0.5,
            max_results: 2000,
            parallel: true,
            ..DetectConfig::default()
        })
        .unwrap();
    c.bench_function("detect_2000_uncapped_parallel", |b| {
        b.iter(|| black_box(par_det.detect(raw.clone(), dest).unwrap()));
    });
}

criterion_group!(benches, bench_detector);
criterion_main!(benches);
