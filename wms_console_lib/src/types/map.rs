use eyre::Result;
use serde::{Deserialize, Serialize};

/// Map descriptor served by the backend's map endpoint.
///
/// Describes the raster the dashboard renders markers onto: a path to the
/// image asset, the metric resolution of the source grid and the map-frame
/// coordinate of the raster's pixel (0, 0) corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapCalibration {
    /// Raster asset path, relative to the backend host
    pub image: String,
    /// Metres per pixel of the source raster
    pub resolution: f64,
    /// Map-frame coordinate of the raster's reference corner
    pub origin: [f64; 2],
}

impl MapCalibration {
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution > 0.0) {
            eyre::bail!(
                "map resolution must be positive, got {}",
                self.resolution
            );
        }
        Ok(())
    }
}

/// Operator-tuned projection correction, one set per deployment.
///
/// The pivot is a metric coordinate matching a visually verifiable landmark
/// on the raster. Scale corrections apply to the pivot-relative pixel delta
/// only, so tuning error does not accumulate away from the pivot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationCorrection {
    pub pivot_x: f64,
    pub pivot_y: f64,
    /// Pixel-space additive corrections
    pub offset_x: f64,
    pub offset_y: f64,
    /// Unitless per-axis corrections on the pivot-relative delta
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for CalibrationCorrection {
    /// Values tuned against the current warehouse map.
    fn default() -> Self {
        Self {
            pivot_x: 1.42,
            pivot_y: 1.72,
            offset_x: -43.0,
            offset_y: -5.0,
            scale_x: 0.85,
            scale_y: 0.80,
        }
    }
}

/// Rendered geometry of the map view: display container size plus the
/// raster's native pixel size once the asset has been fetched and decoded.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub container_width: f64,
    pub container_height: f64,
    pub natural_width: f64,
    pub natural_height: f64,
    /// False until the raster has been decoded
    pub loaded: bool,
}

impl Viewport {
    pub fn new(container_width: f64, container_height: f64) -> Self {
        Self {
            container_width,
            container_height,
            natural_width: 0.0,
            natural_height: 0.0,
            loaded: false,
        }
    }

    pub fn with_natural_size(mut self, width: f64, height: f64) -> Self {
        self.natural_width = width;
        self.natural_height = height;
        self.loaded = true;
        self
    }

    /// Projection is meaningful only once the raster is decoded with
    /// nonzero dimensions.
    pub fn is_ready(&self) -> bool {
        self.loaded && self.natural_width > 0.0 && self.natural_height > 0.0
    }
}

/// Screen-space point in display pixels of the map container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    /// Sentinel returned while the map raster is not ready.
    pub const ORIGIN: PixelPoint = PixelPoint { x: 0.0, y: 0.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_resolution() {
        let cal = MapCalibration {
            image: "/static/map/warehouse.png".to_string(),
            resolution: 0.0,
            origin: [0.0, 0.0],
        };
        assert!(cal.validate().is_err());

        let cal = MapCalibration {
            resolution: -0.05,
            ..cal
        };
        assert!(cal.validate().is_err());
    }

    #[test]
    fn viewport_ready_requires_decoded_raster() {
        let view = Viewport::new(500.0, 400.0);
        assert!(!view.is_ready());

        let view = view.with_natural_size(1000.0, 800.0);
        assert!(view.is_ready());

        let degenerate = Viewport::new(500.0, 400.0).with_natural_size(0.0, 800.0);
        assert!(!degenerate.is_ready());
    }

    #[test]
    fn map_descriptor_parses_backend_shape() {
        let json = r#"{
            "image": "/static/map/warehouse.png",
            "resolution": 0.05,
            "origin": [-1.2, -3.4]
        }"#;
        let cal: MapCalibration = serde_json::from_str(json).unwrap();
        assert_eq!(cal.resolution, 0.05);
        assert_eq!(cal.origin, [-1.2, -3.4]);
        assert!(cal.validate().is_ok());
    }
}
