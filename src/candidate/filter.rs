//! Confidence thresholding and coordinate clamping.

use crate::candidate::Detection;
use crate::config::{DegenerateBoxPolicy, ParseConfig};
use crate::observe::{CandidateVerdict, ClassHistogram, ParseObserver};
use crate::tensor::unpack::RawDetection;
use crate::tensor::FrameSize;
use crate::trace::trace_span;
use crate::util::math::{clamp_coord, ordered};

/// Applies the candidate filter to a single unpacked row.
///
/// Width and height come from the unclamped corners; only `left` and `top`
/// are clamped into the frame.
pub fn filter_row(
    row: &RawDetection,
    frame: FrameSize,
    cfg: &ParseConfig,
) -> (CandidateVerdict, Option<Detection>) {
    let frame_w = frame.width as f32;
    let frame_h = frame.height as f32;

    let (x0, y0, x1, y1) = match cfg.degenerate {
        DegenerateBoxPolicy::Normalize => {
            let (x0, x1) = ordered(row.x0, row.x1);
            let (y0, y1) = ordered(row.y0, row.y1);
            (x0, y0, x1, y1)
        }
        DegenerateBoxPolicy::Keep | DegenerateBoxPolicy::Drop => (row.x0, row.y0, row.x1, row.y1),
    };
    let width = x1 - x0;
    let height = y1 - y0;

    if !cfg
        .size_filter
        .accepts(width, height, row.score, frame_w, frame_h)
    {
        return (CandidateVerdict::SizeRejected, None);
    }

    let threshold = cfg.thresholds.get(row.class_id);
    if row.score.is_nan() || row.score < threshold {
        return (CandidateVerdict::BelowThreshold { threshold }, None);
    }

    let det = Detection {
        left: clamp_coord(x0, 0.0, frame_w),
        top: clamp_coord(y0, 0.0, frame_h),
        width,
        height,
        confidence: row.score,
        class_id: row.class_id,
    };
    if cfg.degenerate == DegenerateBoxPolicy::Drop && det.is_degenerate() {
        return (CandidateVerdict::Degenerate, None);
    }
    (CandidateVerdict::Accepted, Some(det))
}

/// Filters unpacked rows into candidate detections, preserving row order.
///
/// Returns the candidates together with their per-class counts. Every row is
/// reported to `observer` with its verdict.
pub fn filter_candidates<O: ParseObserver + ?Sized>(
    rows: &[RawDetection],
    frame: FrameSize,
    cfg: &ParseConfig,
    observer: &O,
) -> (Vec<Detection>, ClassHistogram) {
    let _span = trace_span!("filter_candidates", rows = rows.len()).entered();

    let mut out = Vec::with_capacity(rows.len());
    let mut counts = ClassHistogram::new(cfg.num_classes);
    for (idx, row) in rows.iter().enumerate() {
        let (verdict, det) = filter_row(row, frame, cfg);
        observer.on_candidate(idx, row, verdict);
        if let Some(det) = det {
            counts.record(det.class_id);
            out.push(det);
        }
    }
    (out, counts)
}
