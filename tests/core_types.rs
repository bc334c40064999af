use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use detpost::{
    iou, CoordinateNormalizer, DecodeIssue, DetPostError, DetectionTensor, DroppedCandidate,
    ErrorKind, ImageSize, LabelTable, NormalizedBox,
};

/// Buffer that counts how often it has been dropped.
struct TrackedBuffer {
    data: Vec<f32>,
    drops: Arc<AtomicUsize>,
}

impl AsRef<[f32]> for TrackedBuffer {
    fn as_ref(&self) -> &[f32] {
        &self.data
    }
}

impl Drop for TrackedBuffer {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn decode_splits_rows_in_order() {
    let data = [
        0.0, 0.0, 10.0, 10.0, 0.9, 0.0, //
        1.0, 2.0, 3.0, 4.0, 0.5, 7.0,
    ];
    let tensor = DetectionTensor::decode_slice(&data).unwrap();
    assert_eq!(tensor.len(), 2);
    assert_eq!(tensor.rows(), 2);
    let second = tensor.get(1).unwrap();
    assert_eq!(second.index, 1);
    assert_eq!(second.bbox, [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(second.score, 0.5);
    assert_eq!(second.class_id, 7);
    assert!(tensor.dropped().is_empty());
}

#[test]
fn decode_rejects_partial_rows() {
    let data = [0.0f32; 7];
    let err = DetectionTensor::decode_slice(&data).err().unwrap();
    assert_eq!(err, DetPostError::TensorShape { len: 7, stride: 6 });
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn decode_accepts_empty_tensor() {
    let tensor = DetectionTensor::decode_slice(&[]).unwrap();
    assert!(tensor.is_empty());
    assert_eq!(tensor.rows(), 0);
}

#[test]
fn decode_drops_malformed_rows_and_keeps_the_rest() {
    let data = [
        0.0, 0.0, 1.0, 1.0, f32::NAN, 0.0, //
        0.0, 0.0, 1.0, 1.0, 0.7, f32::INFINITY, //
        0.0, 0.0, 1.0, 1.0, 0.7, 2.5, //
        0.0, f32::NAN, 1.0, 1.0, 0.7, 1.0, //
        0.0, 0.0, 1.0, 1.0, 0.6, 3.0,
    ];
    let tensor = DetectionTensor::decode_slice(&data).unwrap();
    assert_eq!(tensor.len(), 1);
    assert_eq!(tensor.candidates()[0].index, 4);
    assert_eq!(
        tensor.dropped(),
        &[
            DroppedCandidate {
                index: 0,
                issue: DecodeIssue::NonFiniteScore
            },
            DroppedCandidate {
                index: 1,
                issue: DecodeIssue::NonFiniteClass
            },
            DroppedCandidate {
                index: 2,
                issue: DecodeIssue::InvalidClass
            },
            DroppedCandidate {
                index: 3,
                issue: DecodeIssue::NonFiniteBox
            },
        ]
    );
}

#[test]
fn decode_fails_when_every_row_is_dropped() {
    let data = [
        0.0, 0.0, 1.0, 1.0, f32::NAN, 0.0, //
        0.0, 0.0, 1.0, 1.0, 0.3, f32::NEG_INFINITY,
    ];
    let err = DetectionTensor::decode_slice(&data).err().unwrap();
    assert_eq!(err, DetPostError::NoValidCandidates { total: 2 });
}

#[test]
fn decode_releases_buffer_on_success_and_failure() {
    let drops = Arc::new(AtomicUsize::new(0));

    let ok = TrackedBuffer {
        data: vec![0.0, 0.0, 1.0, 1.0, 0.5, 0.0],
        drops: Arc::clone(&drops),
    };
    let tensor = DetectionTensor::decode(ok).unwrap();
    assert_eq!(tensor.len(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    let bad = TrackedBuffer {
        data: vec![0.0; 5],
        drops: Arc::clone(&drops),
    };
    assert!(DetectionTensor::decode(bad).is_err());
    assert_eq!(drops.load(Ordering::SeqCst), 2);

    let bad_shape = TrackedBuffer {
        data: vec![0.0; 6],
        drops: Arc::clone(&drops),
    };
    assert!(DetectionTensor::decode_shaped(bad_shape, &[2, 1, 6]).is_err());
    assert_eq!(drops.load(Ordering::SeqCst), 3);
}

#[test]
fn decode_shaped_validates_layout() {
    let data = vec![0.0, 0.0, 1.0, 1.0, 0.5, 0.0, 0.0, 0.0, 1.0, 1.0, 0.4, 0.0];
    assert_eq!(
        DetectionTensor::decode_shaped(data.clone(), &[1, 2, 6])
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        DetectionTensor::decode_shaped(data.clone(), &[2, 6])
            .unwrap()
            .len(),
        2
    );

    let err = DetectionTensor::decode_shaped(data.clone(), &[1, 3, 6])
        .err()
        .unwrap();
    assert_eq!(
        err,
        DetPostError::ShapeMismatch {
            expected: "18 values".to_owned(),
            got: "12 values".to_owned(),
        }
    );

    let err = DetectionTensor::decode_shaped(data, &[1, 2, 5]).err().unwrap();
    assert!(matches!(err, DetPostError::ShapeMismatch { .. }));
}

#[test]
fn normalizer_reorders_and_scales() {
    let data = [2.0, 4.0, 6.0, 8.0, 0.9, 0.0];
    let tensor = DetectionTensor::decode_slice(&data).unwrap();
    let candidate = tensor.get(0).unwrap();
    let norm = CoordinateNormalizer::new(10).unwrap();

    let nms_box = norm.normalized(candidate);
    assert_eq!(nms_box, NormalizedBox::from_yxyx([0.4, 0.2, 0.8, 0.6]));
    assert_eq!(norm.box_raw(candidate), [0.2, 0.4, 0.6, 0.8]);

    let dest = ImageSize::new(99, 51).unwrap();
    // 0.2 * 99 = 19.8, 0.4 * 51 = 20.4, 0.6 * 99 = 59.4, 0.8 * 51 = 40.8
    assert_eq!(norm.pixel_box(candidate, dest), [19, 20, 59, 40]);
}

#[test]
fn normalizer_and_image_size_reject_zero() {
    assert_eq!(
        CoordinateNormalizer::new(0).err().unwrap(),
        DetPostError::InvalidInput("model input size must be positive")
    );
    assert_eq!(
        ImageSize::new(0, 4).err().unwrap(),
        DetPostError::InvalidDimensions {
            width: 0,
            height: 4
        }
    );
}

#[test]
fn iou_matches_known_values() {
    let a = NormalizedBox::from_yxyx([0.0, 0.0, 1.0, 1.0]);
    let b = NormalizedBox::from_yxyx([0.0, 0.5, 1.0, 1.5]);
    assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(iou(&a, &a), 1.0);

    let far = NormalizedBox::from_yxyx([2.0, 2.0, 3.0, 3.0]);
    assert_eq!(iou(&a, &far), 0.0);

    let flipped = NormalizedBox::from_yxyx([1.0, 1.0, 0.0, 0.0]);
    assert_eq!(iou(&a, &flipped), 1.0);
}

#[test]
fn iou_of_degenerate_boxes_is_zero() {
    let a = NormalizedBox::from_yxyx([0.0, 0.0, 1.0, 1.0]);
    let line = NormalizedBox::from_yxyx([0.5, 0.0, 0.5, 1.0]);
    let point = NormalizedBox::from_yxyx([0.2, 0.2, 0.2, 0.2]);
    assert_eq!(iou(&a, &line), 0.0);
    assert_eq!(iou(&point, &point), 0.0);
}

#[test]
fn label_table_lookup_and_validation() {
    let labels = LabelTable::new(["cat", "dog", "bird"]);
    assert_eq!(labels.len(), 3);
    assert_eq!(labels.label(1).unwrap(), "dog");

    let err = labels.label(5).err().unwrap();
    assert_eq!(err, DetPostError::ClassOutOfRange { class_id: 5, len: 3 });
    assert_eq!(err.kind(), ErrorKind::Config);

    let err = labels.validate_class_count(80).err().unwrap();
    assert_eq!(
        err,
        DetPostError::LabelCountMismatch {
            labels: 3,
            classes: 80
        }
    );
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn label_table_parses_lines_and_ships_coco() {
    let labels = LabelTable::from_lines("person\n  bicycle \n\ncar\n");
    assert_eq!(labels.iter().collect::<Vec<_>>(), ["person", "bicycle", "car"]);

    let coco = LabelTable::coco();
    assert_eq!(coco.len(), 80);
    assert_eq!(coco.get(0), Some("person"));
    assert_eq!(coco.get(79), Some("toothbrush"));
    assert!(coco.validate_class_count(80).is_ok());
}
