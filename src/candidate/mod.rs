//! Candidate detections and the stages that prune them.
//!
//! Filtering turns unpacked rows into [`Detection`]s; suppression removes
//! same-class duplicates by IoU.

pub(crate) mod filter;
pub(crate) mod iou;
pub(crate) mod nms;

/// A detected object in network pixel space.
///
/// `left`/`top` are clamped into the frame; `width`/`height` keep the values
/// derived from the unclamped corners and may exceed the frame or, for
/// inverted rows, be negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub class_id: usize,
}

impl Detection {
    /// Right edge (`left + width`).
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge (`top + height`).
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Box area; negative for inverted boxes.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Returns true if width or height is not positive (or NaN).
    pub fn is_degenerate(&self) -> bool {
        self.width.is_nan() || self.height.is_nan() || self.width <= 0.0 || self.height <= 0.0
    }

    /// Intersection over union with `other`; see [`iou`](crate::iou).
    pub fn iou(&self, other: &Detection) -> f32 {
        iou::iou(self, other)
    }
}
