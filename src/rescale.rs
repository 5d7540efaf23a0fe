//! Mapping detections from network space to the source frame.
//!
//! Detections come out of the parser in network input pixels (for example a
//! 640x640 letterbox-free resize). Hosts that draw on or crop from the
//! original frame scale them per axis and clip them to the frame.

use crate::candidate::Detection;
use crate::tensor::{FrameSize, NetworkInfo};
use crate::util::{DetParseError, DetParseResult};

/// Per-axis scale from network pixels to source pixels.
pub fn scale_factors(network: NetworkInfo, source: FrameSize) -> DetParseResult<(f32, f32)> {
    if network.width == 0 || network.height == 0 {
        return Err(DetParseError::InvalidInput("network dimensions must be non-zero"));
    }
    Ok((
        source.width as f32 / network.width as f32,
        source.height as f32 / network.height as f32,
    ))
}

/// Scales one detection into the source frame and clips it.
///
/// `left`/`top` are clipped to the last pixel column/row and the extent to the
/// remaining space, so the result always lies inside the frame with a
/// non-negative size.
pub fn rescale_detection(det: &Detection, scale_x: f32, scale_y: f32, source: FrameSize) -> Detection {
    let src_w = source.width as f32;
    let src_h = source.height as f32;

    let left = (det.left * scale_x).min(src_w - 1.0).max(0.0);
    let top = (det.top * scale_y).min(src_h - 1.0).max(0.0);
    let width = (det.width * scale_x).min(src_w - left).max(0.0);
    let height = (det.height * scale_y).min(src_h - top).max(0.0);

    Detection {
        left,
        top,
        width,
        height,
        ..*det
    }
}

/// Scales every detection from network space into `source`, preserving order.
pub fn rescale_to_source(
    dets: &[Detection],
    network: NetworkInfo,
    source: FrameSize,
) -> DetParseResult<Vec<Detection>> {
    let (sx, sy) = scale_factors(network, source)?;
    Ok(dets
        .iter()
        .map(|det| rescale_detection(det, sx, sy, source))
        .collect())
}
