//! Greedy IoU non-maximum suppression.

use std::collections::BTreeMap;

use crate::candidate::Detection;
use crate::trace::{trace_event, trace_span};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Sorts detections by descending confidence, keeping the input order of ties.
pub(crate) fn sort_by_confidence_desc(dets: &mut [Detection]) {
    dets.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

/// Greedy NMS over one group of detections.
///
/// Every detection is compared against every other regardless of class; use
/// [`nms_class_wise`] for per-class suppression. A detection is dropped when
/// its IoU with an already kept, higher-ranked detection exceeds
/// `iou_threshold`. Survivors are returned in descending confidence order.
pub fn nms_greedy(mut dets: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if dets.len() < 2 {
        return dets;
    }

    sort_by_confidence_desc(&mut dets);
    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        let current = dets[i];
        keep.push(current);

        for j in (i + 1)..dets.len() {
            if !suppressed[j] && current.iou(&dets[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Splits detections into per-class groups in ascending class id order.
///
/// Only classes that occur get a group, so sparse or very large ids cost
/// nothing extra.
fn group_by_class(dets: Vec<Detection>) -> Vec<Vec<Detection>> {
    let mut groups: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
    for det in dets {
        groups.entry(det.class_id).or_default().push(det);
    }
    groups.into_values().collect()
}

/// Class-wise greedy NMS.
///
/// Detections only suppress detections of the same class. The result lists
/// classes in ascending id order, each class in descending confidence order.
/// Any class id is accepted; `num_classes` is the configured class count and
/// only feeds diagnostics. With the `rayon` feature and `parallel` set, classes are processed on the
/// rayon pool; the output is identical to the sequential path.
pub fn nms_class_wise(
    dets: Vec<Detection>,
    num_classes: usize,
    iou_threshold: f32,
    parallel: bool,
) -> Vec<Detection> {
    let _span = trace_span!("class_nms", candidates = dets.len(), parallel = parallel).entered();
    let candidates = dets.len();
    let groups = group_by_class(dets);

    #[cfg(feature = "rayon")]
    let kept: Vec<Vec<Detection>> = if parallel {
        groups
            .into_par_iter()
            .map(|group| nms_greedy(group, iou_threshold))
            .collect()
    } else {
        groups
            .into_iter()
            .map(|group| nms_greedy(group, iou_threshold))
            .collect()
    };

    #[cfg(not(feature = "rayon"))]
    let kept: Vec<Vec<Detection>> = {
        let _ = parallel;
        groups
            .into_iter()
            .map(|group| nms_greedy(group, iou_threshold))
            .collect()
    };

    let out: Vec<Detection> = kept.into_iter().flatten().collect();
    trace_event!(
        "class_nms_done",
        classes = num_classes,
        candidates = candidates,
        kept = out.len(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(left: f32, top: f32, size: f32, confidence: f32, class_id: usize) -> Detection {
        Detection {
            left,
            top,
            width: size,
            height: size,
            confidence,
            class_id,
        }
    }

    #[test]
    fn overlapping_lower_score_is_suppressed() {
        let dets = vec![det(0.0, 0.0, 10.0, 0.8, 0), det(0.0, 0.0, 10.0, 0.9, 0)];
        let kept = nms_greedy(dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn iou_equal_to_threshold_is_kept() {
        // IoU = 50 / 150 = 1/3; strict comparison keeps both at 1/3.
        let a = det(0.0, 0.0, 10.0, 0.9, 0);
        let b = Detection {
            left: 5.0,
            ..det(0.0, 0.0, 10.0, 0.8, 0)
        };
        let threshold = a.iou(&b);
        let kept = nms_greedy(vec![a, b], threshold);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let first = det(0.0, 0.0, 10.0, 0.5, 0);
        let second = det(1.0, 1.0, 10.0, 0.5, 0);
        let kept = nms_greedy(vec![first, second], 0.3);
        assert_eq!(kept, vec![first]);

        let kept = nms_greedy(vec![second, first], 0.3);
        assert_eq!(kept, vec![second]);
    }

    #[test]
    fn suppressed_box_does_not_suppress_others() {
        // b overlaps a and c; a suppresses b, so c survives even though b
        // would have suppressed it.
        let a = det(0.0, 0.0, 10.0, 0.9, 0);
        let b = det(4.0, 0.0, 10.0, 0.8, 0);
        let c = det(9.0, 0.0, 10.0, 0.7, 0);
        assert!(a.iou(&b) > 0.3);
        assert!(b.iou(&c) > 0.3);
        assert!(a.iou(&c) <= 0.3);
        let kept = nms_greedy(vec![c, b, a], 0.3);
        assert_eq!(kept, vec![a, c]);
    }

    #[test]
    fn class_wise_never_crosses_classes() {
        let dets = vec![det(0.0, 0.0, 10.0, 0.9, 0), det(0.0, 0.0, 10.0, 0.95, 1)];
        let kept = nms_class_wise(dets, 3, 0.3, false);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].class_id, 0);
        assert_eq!(kept[1].class_id, 1);
    }

    #[test]
    fn class_wise_orders_by_class_then_confidence() {
        let dets = vec![
            det(100.0, 100.0, 10.0, 0.4, 2),
            det(0.0, 0.0, 10.0, 0.6, 1),
            det(200.0, 200.0, 10.0, 0.9, 2),
            det(50.0, 50.0, 10.0, 0.3, 0),
        ];
        let kept = nms_class_wise(dets, 3, 0.3, false);
        let order: Vec<(usize, f32)> = kept.iter().map(|d| (d.class_id, d.confidence)).collect();
        assert_eq!(order, vec![(0, 0.3), (1, 0.6), (2, 0.9), (2, 0.4)]);
    }

    #[test]
    fn class_wise_accepts_ids_past_num_classes() {
        let dets = vec![det(0.0, 0.0, 10.0, 0.9, 5), det(0.0, 0.0, 10.0, 0.8, 0)];
        let kept = nms_class_wise(dets, 1, 0.3, false);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].class_id, 5);
    }

    #[test]
    fn class_wise_handles_extreme_class_ids() {
        let dets = vec![
            det(0.0, 0.0, 10.0, 0.7, usize::MAX),
            det(1.0, 1.0, 10.0, 0.9, usize::MAX),
            det(0.0, 0.0, 10.0, 0.8, 50_000_000),
            det(0.0, 0.0, 10.0, 0.6, 2),
        ];
        let kept = nms_class_wise(dets, 3, 0.3, false);
        let order: Vec<(usize, f32)> = kept.iter().map(|d| (d.class_id, d.confidence)).collect();
        assert_eq!(
            order,
            vec![(2, 0.6), (50_000_000, 0.8), (usize::MAX, 0.9)]
        );
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(nms_class_wise(Vec::new(), 3, 0.3, false).is_empty());
        assert!(nms_greedy(Vec::new(), 0.3).is_empty());
    }
}
