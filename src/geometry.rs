//! Watermark geometry planning.
//!
//! The overlay follows a bouncing trajectory parametrized by playback time
//! `t`: a 20 s horizontal and a 10 s vertical period, reversing direction at
//! each half-period boundary and keeping 10 px clear of the frame edge at
//! the extremes. The position expressions are evaluated by the engine per
//! frame, so only the watermark scale depends on the probed dimensions.

use crate::engine::StreamDimensions;

/// Horizontal bounce period in seconds.
const BOUNCE_PERIOD_X: u32 = 20;
/// Vertical bounce period in seconds.
const BOUNCE_PERIOD_Y: u32 = 10;
/// Gap between the watermark and the frame edge at the extremes, in pixels.
const EDGE_MARGIN: u32 = 10;

/// Pixel dimensions of the visual stream of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Selects dimensions from a probed stream list. The first stream is
    /// preferred; the second is consulted when the first does not expose
    /// both values (audio-first containers). Streams beyond the second are
    /// never consulted. A stream exposing only one of the two dimensions
    /// does not qualify.
    pub fn from_streams(streams: &[StreamDimensions]) -> Option<Self> {
        streams
            .iter()
            .take(2)
            .find_map(|stream| match (stream.width, stream.height) {
                (Some(width), Some(height)) if width > 0 && height > 0 => {
                    Some(Resolution { width, height })
                }
                _ => None,
            })
    }
}

/// Overlay geometry for one task: the watermark target width plus the
/// time-varying position expressions handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkPlan {
    pub scale_width: u32,
    pub overlay_expr_x: String,
    pub overlay_expr_y: String,
}

/// Computes the watermark plan for a source resolution. Deterministic and
/// total for positive dimensions.
///
/// The watermark width targets 10% of the sum of the source dimensions, not
/// of the width alone.
pub fn plan(resolution: Resolution) -> WatermarkPlan {
    let scale_width =
        (((resolution.width + resolution.height) as f64) * 0.1).round().max(1.0) as u32;

    WatermarkPlan {
        scale_width,
        overlay_expr_x: bounce_expr('W', 'w', BOUNCE_PERIOD_X),
        overlay_expr_y: bounce_expr('H', 'h', BOUNCE_PERIOD_Y),
    }
}

/// One bounce axis: the sign term `pow(-1,lt(mod(t,period),half))` flips the
/// watermark between the two extreme positions every half-period.
fn bounce_expr(frame: char, mark: char, period: u32) -> String {
    let half = period / 2;
    format!(
        "{frame}/2-pow(-1,lt(mod(t,{period}),{half}))*(({frame}-{mark})/2-{EDGE_MARGIN})-{mark}/2"
    )
}
