//! Row unpacking for interleaved detection tensors.

use crate::util::{DetParseError, DetParseResult};

/// Number of `f32` values per detection row: `x0, y0, x1, y1, score`.
pub const DET_ROW_STRIDE: usize = 5;

/// One decoded detection row in network pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDetection {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub score: f32,
    /// Class label clamped into `[0, num_classes)`.
    pub class_id: usize,
}

impl RawDetection {
    /// Width derived from the raw corner coordinates; negative for inverted rows.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height derived from the raw corner coordinates; negative for inverted rows.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// Clamps a raw label into `[0, num_classes - 1]`.
///
/// `num_classes` must be non-zero.
pub fn clamp_class_id(label: i32, num_classes: usize) -> usize {
    if label <= 0 {
        return 0;
    }
    (label as usize).min(num_classes.saturating_sub(1))
}

/// Unpacks `num_dets` rows of `dets` and `labels` in row order.
///
/// Every input row yields exactly one output row; nothing is filtered.
pub fn unpack_rows(
    dets: &[f32],
    labels: &[i32],
    num_dets: usize,
    num_classes: usize,
) -> DetParseResult<Vec<RawDetection>> {
    if num_classes == 0 {
        return Err(DetParseError::InvalidConfig("num_classes must be at least 1"));
    }
    if num_dets == 0 {
        return Ok(Vec::new());
    }

    let needed = num_dets
        .checked_mul(DET_ROW_STRIDE)
        .ok_or(DetParseError::InvalidInput("detection row count overflows"))?;
    if dets.len() < needed {
        return Err(DetParseError::BufferTooSmall {
            layer: 0,
            needed,
            got: dets.len(),
        });
    }
    if labels.len() < num_dets {
        return Err(DetParseError::BufferTooSmall {
            layer: 1,
            needed: num_dets,
            got: labels.len(),
        });
    }

    let rows = dets[..needed]
        .chunks_exact(DET_ROW_STRIDE)
        .zip(&labels[..num_dets])
        .map(|(row, &label)| RawDetection {
            x0: row[0],
            y0: row[1],
            x1: row[2],
            y1: row[3],
            score: row[4],
            class_id: clamp_class_id(label, num_classes),
        })
        .collect();
    Ok(rows)
}
