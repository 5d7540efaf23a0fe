//! Individual pipeline stages for custom post-processing.
//!
//! These are the pieces [`crate::DetectionParser`] composes. Use them when the
//! detector output is already split into separate buffers or when a stage
//! needs to be replaced.

pub use crate::candidate::filter::{filter_candidates, filter_row};
pub use crate::candidate::iou::iou;
pub use crate::candidate::nms::{nms_class_wise, nms_greedy};
pub use crate::rescale::{rescale_detection, scale_factors};
pub use crate::tensor::unpack::{clamp_class_id, unpack_rows, RawDetection, DET_ROW_STRIDE};
