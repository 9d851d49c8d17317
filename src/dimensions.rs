//! Dimension Calculator - Physical Units to Pixels
//!
//! Rounding is round-half-away-from-zero (`f64::round`) everywhere in the
//! crate. Byte-exact output depends on it, so do not mix in other modes.

use serde::{Deserialize, Serialize};

pub const CM_PER_INCH: f64 = 2.54;

/// Physical print size in centimeters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalSize {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl PhysicalSize {
    pub const fn new(width_cm: f64, height_cm: f64) -> Self {
        Self { width_cm, height_cm }
    }

    pub fn is_valid(&self) -> bool {
        self.width_cm.is_finite()
            && self.height_cm.is_finite()
            && self.width_cm > 0.0
            && self.height_cm > 0.0
    }
}

impl Default for PhysicalSize {
    fn default() -> Self {
        Self::new(5.0, 3.0)
    }
}

/// Integer canvas size derived from a physical size and a DPI.
///
/// Carried as `u64` so that absurd resolutions are reported by
/// [`CanvasLimits::check`] instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelCanvasSize {
    pub width: u64,
    pub height: u64,
}

impl PixelCanvasSize {
    pub fn area(&self) -> u64 {
        self.width.saturating_mul(self.height)
    }
}

/// `round(cm * dpi / 2.54)` for one axis.
pub fn cm_to_px(cm: f64, dpi: u32) -> u64 {
    // `as` saturates on out-of-range floats.
    (cm * f64::from(dpi) / CM_PER_INCH).round() as u64
}

/// Compute the pixel canvas for a physical size at the given resolution.
///
/// Pure and infallible; callers are responsible for checking the result
/// against [`CanvasLimits`] before allocating anything.
pub fn compute_canvas_px(width_cm: f64, height_cm: f64, dpi: u32) -> PixelCanvasSize {
    PixelCanvasSize {
        width: cm_to_px(width_cm, dpi),
        height: cm_to_px(height_cm, dpi),
    }
}

/// Upper bounds on the raster canvas.
///
/// Defaults mirror the largest canvas common browser engines will allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasLimits {
    pub max_side: u32,
    pub max_area: u64,
}

impl Default for CanvasLimits {
    fn default() -> Self {
        Self {
            max_side: 16_384,
            max_area: 268_435_456,
        }
    }
}

impl CanvasLimits {
    /// Returns the canvas as `(u32, u32)` when it fits, `None` otherwise.
    pub fn check(&self, canvas: PixelCanvasSize) -> Option<(u32, u32)> {
        if canvas.width == 0 || canvas.height == 0 {
            return None;
        }
        if canvas.area() > self.max_area {
            return None;
        }
        let width = u32::try_from(canvas.width).ok()?;
        let height = u32::try_from(canvas.height).ok()?;
        if width > self.max_side || height > self.max_side {
            return None;
        }
        Some((width, height))
    }
}
