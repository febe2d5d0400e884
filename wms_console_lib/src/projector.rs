//! Pivot-anchored metric-to-screen projection for the warehouse map view.
//!
//! The map raster is displayed with a cover fit (scaled until it fills the
//! container on both axes, cropping the excess). Projection is anchored at a
//! calibrated pivot: the per-axis scale corrections apply only to the
//! pivot-relative pixel delta, so calibration error does not grow with
//! distance from the pivot. This is not equivalent to a global affine map
//! unless the offsets are re-derived; the anchoring must be kept as is.

use crate::types::{CalibrationCorrection, MapCalibration, PixelPoint, Viewport};

pub struct PoseProjector {
    calibration: MapCalibration,
    correction: CalibrationCorrection,
}

impl PoseProjector {
    pub fn new(calibration: MapCalibration, correction: CalibrationCorrection) -> Self {
        Self {
            calibration,
            correction,
        }
    }

    /// Project a map-frame metric coordinate onto the rendered map view.
    ///
    /// Returns the `(0, 0)` sentinel while the raster is not ready; the
    /// caller suppresses the marker in that case. For finite inputs on a
    /// ready viewport the result is always finite.
    pub fn project(&self, view: &Viewport, x: f64, y: f64) -> PixelPoint {
        if !view.is_ready() {
            return PixelPoint::ORIGIN;
        }

        let iw = view.natural_width;
        let ih = view.natural_height;
        let cw = view.container_width;
        let ch = view.container_height;

        // Cover fit: scale until the raster fills the container on both axes.
        let fit_scale = (cw / iw).max(ch / ih);

        let resolution = self.calibration.resolution;
        let [origin_x, origin_y] = self.calibration.origin;

        // Pivot in raster pixels, with the vertical flip: row 0 of the
        // raster holds the maximum metric y.
        let pivot_px = (self.correction.pivot_x - origin_x) / resolution;
        let pivot_py = (self.correction.pivot_y - origin_y) / resolution;
        let pivot_py_flip = ih - pivot_py;

        // Centering offset of the scaled raster inside the container.
        let center_x = (cw - iw * fit_scale) / 2.0;
        let center_y = (ch - ih * fit_scale) / 2.0;

        let pivot_global_x = pivot_px * fit_scale + center_x;
        let pivot_global_y = pivot_py_flip * fit_scale + center_y;

        // Query point through the same metric-to-pixel conversion.
        let px = (x - origin_x) / resolution;
        let py = (y - origin_y) / resolution;
        let py_flip = ih - py;

        PixelPoint {
            x: pivot_global_x
                + (px - pivot_px) * fit_scale * self.correction.scale_x
                + self.correction.offset_x,
            y: pivot_global_y
                + (py_flip - pivot_py_flip) * fit_scale * self.correction.scale_y
                + self.correction.offset_y,
        }
    }

    /// Marker rotation for a heading in radians. No wrap to [0, 360).
    pub fn heading_degrees(theta: f64) -> f64 {
        theta * 180.0 / std::f64::consts::PI
    }

    pub fn calibration(&self) -> &MapCalibration {
        &self.calibration
    }

    pub fn correction(&self) -> &CalibrationCorrection {
        &self.correction
    }
}
