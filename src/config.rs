//! Parser configuration.
//!
//! All values here are static for the lifetime of a [`crate::DetectionParser`]:
//! the class count, the per-class threshold table, the IoU cutoff and the
//! optional filtering policies. [`ParseConfig::validate`] is called once when
//! a parser is built, so the per-frame path never re-checks them.

use crate::util::{DetParseError, DetParseResult};

/// Class count of the reference three-class detector.
pub const DEFAULT_NUM_CLASSES: usize = 3;
/// IoU above which a same-class candidate is suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;
/// Confidence threshold used when no per-class table is supplied.
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.25;

/// Minimum confidence per class id.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassThresholds {
    values: Vec<f32>,
}

impl ClassThresholds {
    /// Builds a table with one entry per class id.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Builds a table with the same threshold for `num_classes` classes.
    pub fn uniform(num_classes: usize, threshold: f32) -> Self {
        Self {
            values: vec![threshold; num_classes],
        }
    }

    /// Returns the threshold for `class_id`.
    ///
    /// Ids past the end of the table fall back to the last entry; a validated
    /// config never produces such ids.
    pub fn get(&self, class_id: usize) -> f32 {
        self.values
            .get(class_id)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(DEFAULT_CONF_THRESHOLD)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw table.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Default for ClassThresholds {
    fn default() -> Self {
        Self::uniform(DEFAULT_NUM_CLASSES, DEFAULT_CONF_THRESHOLD)
    }
}

impl From<Vec<f32>> for ClassThresholds {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Size-based rejection of implausible boxes; disabled by default.
///
/// Fractions are relative to the network frame. A box is rejected when it is
/// larger than `max_fraction` on either axis, or smaller than `min_fraction`
/// on either axis while scoring below `small_box_min_score`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeFilter {
    pub enabled: bool,
    pub min_fraction: f32,
    pub max_fraction: f32,
    pub small_box_min_score: f32,
}

impl Default for SizeFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            min_fraction: 0.01,
            max_fraction: 1.0,
            small_box_min_score: 0.7,
        }
    }
}

impl SizeFilter {
    /// Returns true if a box of `width` x `height` passes the filter.
    pub fn accepts(&self, width: f32, height: f32, score: f32, frame_w: f32, frame_h: f32) -> bool {
        if !self.enabled {
            return true;
        }
        let too_small =
            width < self.min_fraction * frame_w || height < self.min_fraction * frame_h;
        let too_big = width > self.max_fraction * frame_w || height > self.max_fraction * frame_h;
        !((too_small && score < self.small_box_min_score) || too_big)
    }
}

/// Treatment of boxes whose decoded width or height is not positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DegenerateBoxPolicy {
    /// Pass degenerate boxes through unchanged.
    #[default]
    Keep,
    /// Reject boxes with `width <= 0` or `height <= 0` after thresholding.
    Drop,
    /// Reorder inverted corner pairs before deriving width and height.
    Normalize,
}

/// Configuration for detection parsing.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseConfig {
    /// Number of classes the detector emits; labels are clamped into range.
    pub num_classes: usize,
    /// Per-class confidence thresholds, at least `num_classes` entries.
    pub thresholds: ClassThresholds,
    /// Same-class IoU above which the lower-confidence box is suppressed.
    pub iou_threshold: f32,
    pub size_filter: SizeFilter,
    pub degenerate: DegenerateBoxPolicy,
    /// Suppress classes on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            num_classes: DEFAULT_NUM_CLASSES,
            thresholds: ClassThresholds::default(),
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            size_filter: SizeFilter::default(),
            degenerate: DegenerateBoxPolicy::Keep,
            parallel: false,
        }
    }
}

impl ParseConfig {
    /// Builds a config for `num_classes` classes sharing one threshold.
    pub fn with_uniform_threshold(num_classes: usize, threshold: f32) -> Self {
        Self {
            num_classes,
            thresholds: ClassThresholds::uniform(num_classes, threshold),
            ..Self::default()
        }
    }

    /// Validates class count, threshold table and filter parameters.
    pub fn validate(&self) -> DetParseResult<()> {
        if self.num_classes == 0 {
            return Err(DetParseError::InvalidConfig("num_classes must be at least 1"));
        }
        if self.thresholds.len() < self.num_classes {
            return Err(DetParseError::InvalidConfig(
                "thresholds must have an entry for every class",
            ));
        }
        if self.thresholds.as_slice().iter().any(|t| !t.is_finite()) {
            return Err(DetParseError::InvalidConfig("thresholds must be finite"));
        }
        if !self.iou_threshold.is_finite() || !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(DetParseError::InvalidConfig(
                "iou_threshold must be within [0, 1]",
            ));
        }
        if self.size_filter.enabled {
            let sf = &self.size_filter;
            if !sf.min_fraction.is_finite() || !sf.max_fraction.is_finite() {
                return Err(DetParseError::InvalidConfig(
                    "size filter fractions must be finite",
                ));
            }
            if sf.min_fraction < 0.0 || sf.max_fraction <= 0.0 {
                return Err(DetParseError::InvalidConfig(
                    "size filter fractions must be positive",
                ));
            }
            if sf.min_fraction > sf.max_fraction {
                return Err(DetParseError::InvalidConfig(
                    "size filter min_fraction must not exceed max_fraction",
                ));
            }
        }
        Ok(())
    }
}
