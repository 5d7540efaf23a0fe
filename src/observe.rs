//! Observability hooks for the parsing pipeline.
//!
//! A [`ParseObserver`] is called at fixed points of every frame: once with the
//! layer list, once per unpacked row with its verdict, once with the label
//! distribution of accepted candidates and once with the frame summary. The
//! return values of the pipeline never depend on the observer.

use crate::candidate::Detection;
use crate::tensor::unpack::RawDetection;
use crate::tensor::LayerInfo;
use crate::trace::{trace_debug, trace_event, trace_warn};
use crate::util::DetParseError;

/// Outcome of the candidate filter for one row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CandidateVerdict {
    /// The row became a candidate detection.
    Accepted,
    /// The score was below the class threshold (or NaN).
    BelowThreshold { threshold: f32 },
    /// The size filter rejected the box.
    SizeRejected,
    /// The degenerate-box policy rejected the box.
    Degenerate,
}

impl CandidateVerdict {
    /// Returns true for [`CandidateVerdict::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, CandidateVerdict::Accepted)
    }

    /// Short label used in trace output.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateVerdict::Accepted => "accepted",
            CandidateVerdict::BelowThreshold { .. } => "below_threshold",
            CandidateVerdict::SizeRejected => "size_rejected",
            CandidateVerdict::Degenerate => "degenerate",
        }
    }
}

/// Number of accepted candidates per class id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassHistogram {
    counts: Vec<usize>,
}

impl ClassHistogram {
    /// Creates an all-zero histogram for `num_classes` classes.
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![0; num_classes],
        }
    }

    /// Counts one candidate of `class_id`, growing the table if needed.
    pub fn record(&mut self, class_id: usize) {
        if class_id >= self.counts.len() {
            self.counts.resize(class_id + 1, 0);
        }
        self.counts[class_id] += 1;
    }

    /// Returns the count for `class_id`.
    pub fn get(&self, class_id: usize) -> usize {
        self.counts.get(class_id).copied().unwrap_or(0)
    }

    /// Returns the total count over all classes.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }
}

/// Per-frame counters reported after suppression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Rows read from the detection layer.
    pub rows: usize,
    /// Rows that passed the candidate filter.
    pub accepted: usize,
    /// Detections left after suppression.
    pub kept: usize,
}

impl FrameSummary {
    /// Rows dropped by the candidate filter.
    pub fn rejected(&self) -> usize {
        self.rows - self.accepted
    }

    /// Candidates removed by suppression.
    pub fn suppressed(&self) -> usize {
        self.accepted - self.kept
    }
}

/// Event sink called by the parser. All methods default to no-ops.
pub trait ParseObserver {
    /// Called with the output layers before any validation.
    fn on_layers(&self, _layers: &[LayerInfo<'_>]) {}

    /// Called once per unpacked row, in row order.
    fn on_candidate(&self, _row: usize, _det: &RawDetection, _verdict: CandidateVerdict) {}

    /// Called with the label distribution of accepted candidates.
    fn on_class_counts(&self, _counts: &ClassHistogram) {}

    /// Called when a frame finishes successfully, including empty frames.
    fn on_frame(&self, _summary: &FrameSummary, _objects: &[Detection]) {}

    /// Called when a frame fails before producing output.
    fn on_error(&self, _err: &DetParseError) {}
}

impl<T: ParseObserver + ?Sized> ParseObserver for &T {
    fn on_layers(&self, layers: &[LayerInfo<'_>]) {
        (**self).on_layers(layers)
    }

    fn on_candidate(&self, row: usize, det: &RawDetection, verdict: CandidateVerdict) {
        (**self).on_candidate(row, det, verdict)
    }

    fn on_class_counts(&self, counts: &ClassHistogram) {
        (**self).on_class_counts(counts)
    }

    fn on_frame(&self, summary: &FrameSummary, objects: &[Detection]) {
        (**self).on_frame(summary, objects)
    }

    fn on_error(&self, err: &DetParseError) {
        (**self).on_error(err)
    }
}

/// Observer that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ParseObserver for NoopObserver {}

/// Observer that forwards events to `tracing` when the feature is enabled.
///
/// Layer dumps and frame summaries are info-level; per-candidate and
/// per-object events are debug-level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceObserver;

impl ParseObserver for TraceObserver {
    fn on_layers(&self, layers: &[LayerInfo<'_>]) {
        for (index, layer) in layers.iter().enumerate() {
            let dtype = layer.data_type().map_or("none", data_type_str);
            trace_event!(
                "output_layer",
                index = index,
                layer = layer.name(),
                data_type = dtype,
                num_dims = layer.dims().len(),
                leading_dim = layer.leading_dim(),
            );
        }
    }

    fn on_candidate(&self, row: usize, det: &RawDetection, verdict: CandidateVerdict) {
        trace_debug!(
            "candidate",
            row = row,
            class_id = det.class_id,
            score = det.score,
            width = det.width(),
            height = det.height(),
            verdict = verdict.as_str(),
        );
    }

    fn on_class_counts(&self, counts: &ClassHistogram) {
        for (class_id, &count) in counts.as_slice().iter().enumerate() {
            trace_debug!("class_count", class_id = class_id, count = count);
        }
    }

    fn on_frame(&self, summary: &FrameSummary, objects: &[Detection]) {
        if summary.rows == 0 {
            trace_warn!("empty_frame", rows = summary.rows);
        }
        trace_event!(
            "frame_parsed",
            rows = summary.rows,
            accepted = summary.accepted,
            kept = summary.kept,
        );
        for (index, obj) in objects.iter().enumerate() {
            trace_debug!(
                "object",
                index = index,
                class_id = obj.class_id,
                confidence = obj.confidence,
                left = obj.left,
                top = obj.top,
                width = obj.width,
                height = obj.height,
            );
        }
    }

    fn on_error(&self, err: &DetParseError) {
        let structural = err.is_structural();
        trace_warn!("frame_failed", structural = structural);
    }
}

fn data_type_str(dtype: crate::tensor::DataType) -> &'static str {
    match dtype {
        crate::tensor::DataType::Float => "float",
        crate::tensor::DataType::Int8 => "int8",
        crate::tensor::DataType::Int32 => "int32",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_grows_on_unknown_class() {
        let mut hist = ClassHistogram::new(2);
        hist.record(0);
        hist.record(0);
        hist.record(4);
        assert_eq!(hist.get(0), 2);
        assert_eq!(hist.get(1), 0);
        assert_eq!(hist.get(4), 1);
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.as_slice().len(), 5);
    }

    #[test]
    fn summary_derives_dropped_counts() {
        let summary = FrameSummary {
            rows: 10,
            accepted: 6,
            kept: 4,
        };
        assert_eq!(summary.rejected(), 4);
        assert_eq!(summary.suppressed(), 2);
    }
}
