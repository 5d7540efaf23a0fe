//! Intersection-over-union for axis-aligned boxes.

use crate::candidate::Detection;

/// Computes intersection over union of two boxes.
///
/// Returns `0.0` when the union is not strictly positive, which covers pairs
/// of zero-area boxes and boxes with negative extent.
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.left.max(b.left);
    let y1 = a.top.max(b.top);
    let x2 = a.right().min(b.right());
    let y2 = a.bottom().min(b.bottom());

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;
    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::iou;
    use crate::candidate::Detection;

    fn det(left: f32, top: f32, width: f32, height: f32) -> Detection {
        Detection {
            left,
            top,
            width,
            height,
            confidence: 0.5,
            class_id: 0,
        }
    }

    #[test]
    fn identical_boxes_have_unit_iou() {
        let a = det(10.0, 10.0, 20.0, 20.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn disjoint_boxes_have_zero_iou() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(20.0, 20.0, 10.0, 10.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn half_overlap_matches_closed_form() {
        let a = det(0.0, 0.0, 10.0, 10.0);
        let b = det(5.0, 0.0, 10.0, 10.0);
        // 50 / (100 + 100 - 50)
        assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-6);
        assert!((iou(&b, &a) - iou(&a, &b)).abs() < 1e-7);
    }

    #[test]
    fn zero_area_pair_is_zero_not_nan() {
        let a = det(5.0, 5.0, 0.0, 0.0);
        assert_eq!(iou(&a, &a), 0.0);
    }

    #[test]
    fn inverted_box_never_overlaps() {
        let a = det(10.0, 10.0, -5.0, 8.0);
        let b = det(0.0, 0.0, 40.0, 40.0);
        assert_eq!(iou(&a, &b), 0.0);
        assert_eq!(iou(&a, &a), 0.0);
    }
}
