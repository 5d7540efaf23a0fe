//! Per-frame orchestration: unpack, filter, suppress.

use crate::candidate::filter::filter_candidates;
use crate::candidate::nms::nms_class_wise;
use crate::candidate::Detection;
use crate::config::ParseConfig;
use crate::observe::{FrameSummary, ParseObserver, TraceObserver};
use crate::tensor::unpack::unpack_rows;
use crate::tensor::{LayerInfo, NetworkInfo};
use crate::trace::trace_span;
use crate::util::{DetParseError, DetParseResult};

/// Output layers the parser reads: detection rows and class labels.
pub const REQUIRED_OUTPUT_LAYERS: usize = 2;
/// Index of the `(x0, y0, x1, y1, score)` row layer.
pub const DETS_LAYER: usize = 0;
/// Index of the class label layer.
pub const LABELS_LAYER: usize = 1;

/// Detector output parser bound to a validated configuration.
///
/// The parser holds no per-frame state; [`DetectionParser::parse`] can be
/// called for every frame, from several threads if the observer allows it.
pub struct DetectionParser<O = TraceObserver> {
    cfg: ParseConfig,
    observer: O,
}

impl DetectionParser<TraceObserver> {
    /// Creates a parser after validating `cfg`.
    pub fn new(cfg: ParseConfig) -> DetParseResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            observer: TraceObserver,
        })
    }
}

impl<O: ParseObserver> DetectionParser<O> {
    /// Replaces the observer.
    pub fn with_observer<P: ParseObserver>(self, observer: P) -> DetectionParser<P> {
        DetectionParser {
            cfg: self.cfg,
            observer,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ParseConfig {
        &self.cfg
    }

    /// Returns the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Parses one frame of detector output into deduplicated detections.
    ///
    /// Fewer than two output layers, a wrongly typed layer, or a buffer shorter
    /// than its row count is an error. Absent buffers or zero rows yield
    /// `Ok` with an empty list.
    pub fn parse(
        &self,
        layers: &[LayerInfo<'_>],
        network: NetworkInfo,
    ) -> DetParseResult<Vec<Detection>> {
        let _span = trace_span!("parse_frame", layers = layers.len()).entered();
        self.observer.on_layers(layers);

        match self.parse_inner(layers, network) {
            Ok((summary, objects)) => {
                self.observer.on_frame(&summary, &objects);
                Ok(objects)
            }
            Err(err) => {
                self.observer.on_error(&err);
                Err(err)
            }
        }
    }

    fn parse_inner(
        &self,
        layers: &[LayerInfo<'_>],
        network: NetworkInfo,
    ) -> DetParseResult<(FrameSummary, Vec<Detection>)> {
        if layers.len() < REQUIRED_OUTPUT_LAYERS {
            return Err(DetParseError::MissingOutputLayers {
                needed: REQUIRED_OUTPUT_LAYERS,
                got: layers.len(),
            });
        }

        let dets_layer = &layers[DETS_LAYER];
        let labels_layer = &layers[LABELS_LAYER];
        let num_dets = dets_layer.leading_dim();

        let (dets, labels) = match (dets_layer.data(), labels_layer.data()) {
            (Some(dets), Some(labels)) if num_dets > 0 => (dets, labels),
            _ => return Ok((FrameSummary::default(), Vec::new())),
        };
        let dets = dets.as_f32(DETS_LAYER)?;
        let labels = labels.as_i32(LABELS_LAYER)?;

        let rows = unpack_rows(dets, labels, num_dets, self.cfg.num_classes)?;
        let (candidates, counts) =
            filter_candidates(&rows, network.frame_size(), &self.cfg, &self.observer);
        self.observer.on_class_counts(&counts);

        let accepted = candidates.len();
        let objects = nms_class_wise(
            candidates,
            self.cfg.num_classes,
            self.cfg.iou_threshold,
            self.cfg.parallel,
        );
        let summary = FrameSummary {
            rows: rows.len(),
            accepted,
            kept: objects.len(),
        };
        Ok((summary, objects))
    }
}

/// Parses one frame with a throwaway parser and the default observer.
///
/// Prefer [`DetectionParser`] when parsing many frames with one config, so the
/// config is validated once.
pub fn parse_detections(
    layers: &[LayerInfo<'_>],
    network: NetworkInfo,
    cfg: &ParseConfig,
) -> DetParseResult<Vec<Detection>> {
    DetectionParser::new(cfg.clone())?.parse(layers, network)
}
