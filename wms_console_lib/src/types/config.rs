use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::types::map::CalibrationCorrection;

/// Environment variable naming the config file to load.
pub const CONFIG_ENV: &str = "WMS_CONSOLE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub stage_labels: StageLabels,
    pub map_view: MapViewConfig,
    pub correction: CalibrationCorrection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub api_url: String,
    pub ws_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            ws_url: "ws://127.0.0.1:8000/ws".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before a reconnect attempt after the socket drops
    pub reconnect_delay_ms: u64,
    /// Keep-alive ping period
    pub ping_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 2_000,
            ping_interval_ms: 25_000,
        }
    }
}

/// Stage vocabulary of the backend contract.
///
/// The label strings and the home sentinel have changed between server
/// iterations, so they are configuration, never literals in code paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLabels {
    pub moving: String,
    pub returning: String,
    pub waiting: String,
    /// Label published on the emergency stop
    pub emergency: String,
    /// Destination id meaning the robot is back at base
    pub home_pin: String,
}

impl Default for StageLabels {
    fn default() -> Self {
        Self {
            moving: "moving".to_string(),
            returning: "returning".to_string(),
            waiting: "waiting".to_string(),
            emergency: "emergency_stop".to_string(),
            home_pin: "WAIT".to_string(),
        }
    }
}

/// Coarse meaning of a broadcast stage label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageClass {
    Moving,
    Returning,
    Waiting,
}

impl StageLabels {
    /// Match a broadcast label against the configured vocabulary.
    /// Labels outside it carry no stage meaning.
    pub fn classify(&self, label: &str) -> Option<StageClass> {
        if label == self.moving {
            Some(StageClass::Moving)
        } else if label == self.returning {
            Some(StageClass::Returning)
        } else if label == self.waiting {
            Some(StageClass::Waiting)
        } else {
            None
        }
    }

    pub fn is_home(&self, pin: &str) -> bool {
        pin == self.home_pin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    pub container_width: f64,
    pub container_height: f64,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            container_width: 500.0,
            container_height: 400.0,
        }
    }
}

impl ConsoleConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ConsoleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the path in `WMS_CONSOLE_CONFIG`, falling back to the
    /// deployment defaults when unset.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.ping_interval_ms == 0 {
            eyre::bail!("ping interval must be nonzero");
        }
        if self.stage_labels.home_pin.trim().is_empty() {
            eyre::bail!("home pin sentinel must not be empty");
        }
        if self.stage_labels.moving.trim().is_empty()
            || self.stage_labels.returning.trim().is_empty()
            || self.stage_labels.waiting.trim().is_empty()
        {
            eyre::bail!("stage label vocabulary must not contain empty labels");
        }
        if !(self.map_view.container_width > 0.0 && self.map_view.container_height > 0.0) {
            eyre::bail!(
                "map view container must have positive dimensions, got {}x{}",
                self.map_view.container_width,
                self.map_view.container_height
            );
        }
        if self.correction.scale_x == 0.0 || self.correction.scale_y == 0.0 {
            eyre::bail!("calibration scale corrections must be nonzero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.reconnect_delay_ms, 2_000);
        assert_eq!(config.stage_labels.home_pin, "WAIT");
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let toml = r#"
            [backend]
            ws_url = "ws://warehouse.local:8000/ws"

            [stage_labels]
            home_pin = "HOME"

            [correction]
            pivot_x = 2.0
            pivot_y = 3.0
        "#;
        let config: ConsoleConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.ws_url, "ws://warehouse.local:8000/ws");
        // Untouched sections keep their defaults
        assert_eq!(config.backend.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.stage_labels.home_pin, "HOME");
        assert_eq!(config.correction.pivot_x, 2.0);
        assert_eq!(config.correction.offset_x, -43.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn classify_uses_configured_vocabulary() {
        let labels = StageLabels {
            moving: "이동중".to_string(),
            returning: "복귀중".to_string(),
            waiting: "대기중".to_string(),
            ..StageLabels::default()
        };
        assert_eq!(labels.classify("이동중"), Some(StageClass::Moving));
        assert_eq!(labels.classify("복귀중"), Some(StageClass::Returning));
        assert_eq!(labels.classify("대기중"), Some(StageClass::Waiting));
        assert_eq!(labels.classify("moving"), None);
    }

    #[test]
    fn empty_sentinel_is_rejected() {
        let mut config = ConsoleConfig::default();
        config.stage_labels.home_pin = " ".to_string();
        assert!(config.validate().is_err());
    }
}
