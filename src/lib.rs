//! detparse turns raw object-detector output tensors into deduplicated
//! detections.
//!
//! A frame passes through three stages: rows of `(x0, y0, x1, y1, score)` and
//! their class labels are unpacked, filtered by per-class confidence and
//! clamped to the network frame, then suppressed class-wise with greedy IoU
//! NMS. [`DetectionParser`] drives the stages; [`lowlevel`] exposes them
//! individually. Class-parallel suppression is available via the `rayon`
//! feature and structured events via the `tracing` feature.

mod candidate;
pub mod config;
pub mod lowlevel;
pub mod observe;
pub mod parser;
pub mod rescale;
pub mod tensor;
pub(crate) mod trace;
pub mod util;

pub use candidate::iou::iou;
pub use candidate::nms::{nms_class_wise, nms_greedy};
pub use candidate::Detection;
pub use config::{ClassThresholds, DegenerateBoxPolicy, ParseConfig, SizeFilter};
pub use observe::{
    CandidateVerdict, ClassHistogram, FrameSummary, NoopObserver, ParseObserver, TraceObserver,
};
pub use parser::{parse_detections, DetectionParser};
pub use rescale::rescale_to_source;
pub use tensor::{DataType, FrameSize, LayerData, LayerInfo, NetworkInfo};
pub use util::{DetParseError, DetParseResult};
