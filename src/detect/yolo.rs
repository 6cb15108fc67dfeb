//! Decoding helpers for YOLOv8-style detection heads.
//!
//! The head output is a `[1, 4 + classes, anchors]` tensor, stored
//! channel-major: `output[channel * anchors + anchor]`. Channels 0..4 are
//! `cx, cy, w, h` in model-input pixels, the rest are per-class scores.

use crate::detect::result::{BoundingBox, Detection};

/// Class names of the VisDrone dataset, in model output order.
pub const VISDRONE_CLASSES: [&str; 10] = [
    "pedestrian",
    "people",
    "bicycle",
    "car",
    "van",
    "truck",
    "tricycle",
    "awning-tricycle",
    "bus",
    "motor",
];

#[derive(Clone, Debug, PartialEq)]
pub struct YoloParams {
    /// Square model input side in pixels.
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
        }
    }
}

/// Name for class `index`, falling back to `class_<index>`.
pub fn class_name(names: &[String], index: usize) -> String {
    names
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", index))
}

/// Turn a raw head output into detections in original-image pixels.
///
/// `scale_x`/`scale_y` map model-input pixels back to the source image.
/// Returns an empty list when `output` is shorter than the declared shape.
pub fn decode_predictions(
    output: &[f32],
    num_classes: usize,
    num_anchors: usize,
    scale: (f64, f64),
    params: &YoloParams,
    class_names: &[String],
) -> Vec<Detection> {
    if output.len() < (4 + num_classes) * num_anchors {
        return Vec::new();
    }
    let at = |channel: usize, anchor: usize| output[channel * num_anchors + anchor];

    let candidates = (0..num_anchors).filter_map(|anchor| {
        let (class, score) = (0..num_classes)
            .map(|class| (class, at(4 + class, anchor)))
            .max_by(|a, b| a.1.total_cmp(&b.1))?;
        if !score.is_finite() || score < params.confidence_threshold {
            return None;
        }
        let bbox = BoundingBox::from_center(
            at(0, anchor) as f64 * scale.0,
            at(1, anchor) as f64 * scale.1,
            at(2, anchor) as f64 * scale.0,
            at(3, anchor) as f64 * scale.1,
        );
        Some(Detection::new(class_name(class_names, class), bbox, score))
    });

    let mut kept = non_max_suppression(candidates.collect(), params.iou_threshold);
    kept.truncate(params.max_detections);
    kept
}

/// Class-wise greedy NMS. Output is sorted by descending confidence.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = kept.iter().any(|k| {
            k.label == det.label && k.bbox.iou(&det.bbox) > iou_threshold as f64
        });
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["car".to_string(), "bus".to_string()]
    }

    /// Three anchors, two classes, channel-major.
    fn head() -> Vec<f32> {
        let cx = [100.0, 104.0, 300.0];
        let cy = [100.0, 100.0, 300.0];
        let w = [40.0, 40.0, 20.0];
        let h = [40.0, 40.0, 20.0];
        let car = [0.9, 0.8, 0.1];
        let bus = [0.05, 0.1, 0.6];
        [cx, cy, w, h, car, bus].concat()
    }

    #[test]
    fn decodes_and_suppresses_overlaps() {
        let dets = decode_predictions(&head(), 2, 3, (2.0, 0.5), &YoloParams::default(), &names());
        assert_eq!(dets.len(), 2);

        assert_eq!(dets[0].label, "car");
        assert_eq!(dets[0].confidence, 0.9);
        assert_eq!(dets[0].bbox, BoundingBox::new(160.0, 40.0, 240.0, 60.0));

        assert_eq!(dets[1].label, "bus");
        assert_eq!(dets[1].bbox.center(), (600.0, 150.0));
    }

    #[test]
    fn threshold_and_cap_apply() {
        let strict = YoloParams {
            confidence_threshold: 0.85,
            ..YoloParams::default()
        };
        let dets = decode_predictions(&head(), 2, 3, (1.0, 1.0), &strict, &names());
        assert_eq!(dets.len(), 1);

        let capped = YoloParams {
            max_detections: 1,
            iou_threshold: 1.0,
            ..YoloParams::default()
        };
        assert_eq!(decode_predictions(&head(), 2, 3, (1.0, 1.0), &capped, &names()).len(), 1);
    }

    #[test]
    fn short_output_decodes_to_nothing() {
        assert!(decode_predictions(&[0.0; 5], 2, 3, (1.0, 1.0), &YoloParams::default(), &names())
            .is_empty());
    }

    #[test]
    fn nms_keeps_overlapping_boxes_of_other_classes() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let dets = vec![
            Detection::new("car", b, 0.6),
            Detection::new("bus", b, 0.7),
            Detection::new("car", b, 0.9),
        ];
        let kept = non_max_suppression(dets, 0.5);
        let summary: Vec<(&str, f32)> = kept.iter().map(|d| (d.label.as_str(), d.confidence)).collect();
        assert_eq!(summary, vec![("car", 0.9), ("bus", 0.7)]);
    }

    #[test]
    fn unnamed_classes_get_an_index_label() {
        assert_eq!(class_name(&names(), 1), "bus");
        assert_eq!(class_name(&names(), 7), "class_7");
    }
}
