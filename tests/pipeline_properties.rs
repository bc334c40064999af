//! Randomized checks of the detector's output guarantees.

use detpost::{
    iou, DetectConfig, Detection, Detector, ImageSize, LabelTable, ModelSpec, NormalizedBox,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const INPUT_SIZE: usize = 320;
const NUM_CLASSES: usize = 5;

fn random_tensor(rng: &mut StdRng, rows: usize) -> Vec<f32> {
    let s = INPUT_SIZE as f32;
    let mut data = Vec::with_capacity(rows * 6);
    for _ in 0..rows {
        let x1 = rng.random_range(0.0..s * 0.9);
        let y1 = rng.random_range(0.0..s * 0.9);
        let w = rng.random_range(1.0..s * 0.3);
        let h = rng.random_range(1.0..s * 0.3);
        data.extend_from_slice(&[
            x1,
            y1,
            (x1 + w).min(s),
            (y1 + h).min(s),
            rng.random::<f32>(),
            rng.random_range(0..NUM_CLASSES) as f32,
        ]);
    }
    data
}

fn detector(cfg: DetectConfig) -> Detector {
    let labels = LabelTable::new((0..NUM_CLASSES).map(|i| format!("class{i}")));
    Detector::new(
        ModelSpec {
            input_size: INPUT_SIZE,
            num_classes: NUM_CLASSES,
        },
        labels,
    )
    .unwrap()
    .with_config(cfg)
    .unwrap()
}

fn nms_box(det: &Detection) -> NormalizedBox {
    let [x1, y1, x2, y2] = det.bbox_raw;
    NormalizedBox::from_yxyx([y1, x1, y2, x2])
}

fn configs() -> Vec<DetectConfig> {
    vec![
        DetectConfig::default(),
        DetectConfig {
            min_score: 0.5,
            iou_threshold: 0.2,
            max_results: 50,
            ..DetectConfig::default()
        },
        DetectConfig {
            min_score: 0.0,
            iou_threshold: 0.7,
            max_results: 5,
            ..DetectConfig::default()
        },
    ]
}

#[test]
fn outputs_respect_score_count_and_overlap_limits() {
    let mut rng = StdRng::seed_from_u64(7);
    let dest = ImageSize::new(1280, 720).unwrap();
    for cfg in configs() {
        let det = detector(cfg.clone());
        for _ in 0..20 {
            let rows = rng.random_range(0..400);
            let out = det.detect(random_tensor(&mut rng, rows), dest).unwrap();

            assert!(out.len() <= cfg.max_results);
            for d in &out {
                assert!(d.score >= cfg.min_score);
            }
            for w in out.windows(2) {
                assert!(w[0].score >= w[1].score);
            }
            for (i, a) in out.iter().enumerate() {
                for b in &out[i + 1..] {
                    let overlap = iou(&nms_box(a), &nms_box(b));
                    assert!(
                        overlap <= cfg.iou_threshold,
                        "ids {} and {} overlap {overlap}",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }
}

#[test]
fn repeated_runs_are_identical() {
    let mut rng = StdRng::seed_from_u64(11);
    let dest = ImageSize::new(640, 480).unwrap();
    let det = detector(DetectConfig::default());
    for _ in 0..10 {
        let raw = random_tensor(&mut rng, 300);
        let first = det.detect(raw.clone(), dest).unwrap();
        let second = det.detect(raw, dest).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn ties_are_resolved_deterministically() {
    let mut rng = StdRng::seed_from_u64(3);
    let dest = ImageSize::new(640, 640).unwrap();
    let det = detector(DetectConfig::default());
    let mut raw = random_tensor(&mut rng, 200);
    for row in raw.chunks_exact_mut(6) {
        row[4] = 0.5;
    }
    let out = det.detect(raw.clone(), dest).unwrap();
    assert_eq!(out, det.detect(raw, dest).unwrap());
    assert_eq!(out[0].id, 0);
    for w in out.windows(2) {
        assert!(w[0].id < w[1].id);
    }
}

#[test]
fn threshold_of_one_disables_suppression() {
    let mut rng = StdRng::seed_from_u64(5);
    let dest = ImageSize::new(320, 320).unwrap();
    let cfg = DetectConfig {
        min_score: 0.3,
        iou_threshold: 1.0,
        max_results: 1000,
        ..DetectConfig::default()
    };
    let det = detector(cfg);
    let mut raw = random_tensor(&mut rng, 100);
    // Duplicate every row so identical boxes are present.
    let copy = raw.clone();
    raw.extend_from_slice(&copy);
    let expected = raw.chunks_exact(6).filter(|row| row[4] >= 0.3).count();
    assert_eq!(det.detect(raw, dest).unwrap().len(), expected);
}

#[test]
fn pixel_boxes_round_trip_to_normalized_boxes() {
    let mut rng = StdRng::seed_from_u64(13);
    let dest = ImageSize::new(1023, 577).unwrap();
    let det = detector(DetectConfig {
        max_results: 100,
        ..DetectConfig::default()
    });
    let out = det.detect(random_tensor(&mut rng, 300), dest).unwrap();
    assert!(!out.is_empty());
    let dims = [dest.width(), dest.height(), dest.width(), dest.height()];
    for d in &out {
        for i in 0..4 {
            let dim = dims[i] as f32;
            let diff = d.bbox_raw[i] - d.bbox[i] as f32 / dim;
            assert!(
                (-1e-5..1.0 / dim + 1e-5).contains(&diff),
                "coordinate {i} of id {} off by {diff}",
                d.id
            );
        }
    }
}
