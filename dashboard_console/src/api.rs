//! REST client for the warehouse backend.

use eyre::Result;
use serde::{Deserialize, Serialize};
use wms_console_lib::MapCalibration;

/// Robot row from the roster endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Robot {
    pub id: i64,
    pub name: String,
    pub ip: String,
}

/// Storage location pin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub id: i64,
    pub name: String,
    pub coords: Option<String>,
}

/// Stock row joined with its category and pin names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub category_name: String,
    pub pin_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobotConnState {
    #[serde(default)]
    pub connected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectAck {
    pub message: String,
}

#[derive(Serialize)]
struct RobotCreate<'a> {
    name: &'a str,
    ip: &'a str,
}

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn robots(&self) -> Result<Vec<Robot>> {
        let url = format!("{}/robots/", self.base_url);
        let robots = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(robots)
    }

    pub async fn robot_status(&self, id: i64) -> Result<RobotConnState> {
        let url = format!("{}/robots/status/{}", self.base_url, id);
        let state = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(state)
    }

    /// Ask the backend's bridge to connect to this robot.
    pub async fn connect_robot(&self, id: i64) -> Result<ConnectAck> {
        let url = format!("{}/robots/connect/{}", self.base_url, id);
        let ack = self
            .client
            .post(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(ack)
    }

    pub async fn create_robot(&self, name: &str, ip: &str) -> Result<Robot> {
        let url = format!("{}/robots/", self.base_url);
        let robot = self
            .client
            .post(&url)
            .json(&RobotCreate { name, ip })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(robot)
    }

    pub async fn delete_robot(&self, id: i64) -> Result<()> {
        let url = format!("{}/robots/{}", self.base_url, id);
        self.client
            .delete(&url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn pins(&self) -> Result<Vec<Pin>> {
        let url = format!("{}/pins/", self.base_url);
        let pins = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(pins)
    }

    pub async fn stocks(&self) -> Result<Vec<Stock>> {
        let url = format!("{}/stocks/", self.base_url);
        let stocks = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(stocks)
    }

    /// Fetch the map descriptor and check its invariants.
    pub async fn map_info(&self) -> Result<MapCalibration> {
        let url = format!("{}/map/info", self.base_url);
        let calibration: MapCalibration = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        calibration.validate()?;
        Ok(calibration)
    }

    /// Fetch the map raster and probe its native pixel size. The projector
    /// stays in its not-ready state until this succeeds.
    pub async fn map_natural_size(&self, calibration: &MapCalibration) -> Result<(u32, u32)> {
        let url = if calibration.image.starts_with("http") {
            calibration.image.clone()
        } else {
            format!("{}{}", self.base_url, calibration.image)
        };
        let bytes = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let raster = image::load_from_memory(&bytes)?;
        Ok((raster.width(), raster.height()))
    }
}
