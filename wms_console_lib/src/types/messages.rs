use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::speed::gear_cap;

/// Messages pushed by the backend over the socket.
///
/// The wire shape is a `{ "type": ..., "payload": ... }` envelope owned by
/// the backend contract; this enum only mirrors the types the console
/// reacts to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Robot bridge presence/connection report
    Status(StatusPayload),
    /// Free-text stage label broadcast
    RobotStatus(RobotStatusPayload),
    /// Destination reached notification
    RobotArrived(RobotArrivedPayload),
    Battery(BatteryPayload),
    /// Localized pose in the map frame
    AmclPose(AmclPosePayload),
    /// Odometry twist, optionally with a position estimate
    Odom(OdomPayload),
    Diagnostics(DiagnosticsPayload),
    /// Manual-override keypress relayed from the robot
    TeleopKey(TeleopKeyPayload),
}

impl InboundMessage {
    /// Parse a frame off the socket. Malformed frames and types outside the
    /// console contract are logged and dropped, leaving all state untouched.
    pub fn parse(raw: &str) -> Option<InboundMessage> {
        match serde_json::from_str(raw) {
            Ok(msg) => Some(msg),
            Err(err) => {
                tracing::warn!(%err, "dropping unparseable frame");
                None
            }
        }
    }

    /// Robot addressed by this message, when the payload names one.
    pub fn robot_name(&self) -> Option<&str> {
        match self {
            InboundMessage::Status(p) => p.robot_name.as_deref(),
            InboundMessage::RobotStatus(p) => p.robot(),
            InboundMessage::RobotArrived(p) => p.robot_name.as_deref(),
            InboundMessage::Battery(p) => p.robot_name.as_deref(),
            InboundMessage::AmclPose(p) => p.robot_name.as_deref(),
            InboundMessage::Odom(p) => p.robot_name.as_deref(),
            InboundMessage::Diagnostics(_) => None,
            InboundMessage::TeleopKey(p) => p.robot_name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub robot_name: Option<String>,
    pub ip: Option<String>,
    #[serde(default)]
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotStatusPayload {
    /// Stage label; vocabulary is the server's, matched through config
    pub state: String,
    pub robot_name: Option<String>,
    /// Older broadcasts carried the robot under `name`
    pub name: Option<String>,
}

impl RobotStatusPayload {
    pub fn robot(&self) -> Option<&str> {
        self.robot_name.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotArrivedPayload {
    /// Destination pin the robot stopped at
    pub pin: String,
    pub robot_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryPayload {
    pub robot_name: Option<String>,
    /// Charge as 0-1 or 0-100 depending on the bridge version
    pub percentage: Option<f64>,
    /// Alias used by older bridges
    pub level: Option<f64>,
    pub voltage: Option<f64>,
}

impl BatteryPayload {
    /// Charge normalized to 0-100. Fractional readings (<= 1) are scaled up;
    /// non-finite readings are rejected.
    pub fn normalized_level(&self) -> Option<f64> {
        let mut level = self.percentage.or(self.level)?;
        if !level.is_finite() {
            return None;
        }
        if level <= 1.0 {
            level *= 100.0;
        }
        Some(level.clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmclPosePayload {
    pub x: f64,
    pub y: f64,
    /// Heading in radians, (-pi, pi]
    #[serde(default)]
    pub theta: f64,
    pub robot_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vector3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdomPayload {
    pub robot_name: Option<String>,
    pub linear: Option<Vector3>,
    pub angular: Option<Vector3>,
    pub position: Option<Position2>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsPayload {
    pub status: Option<String>,
    pub color: Option<String>,
    pub message: Option<String>,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleopKeyPayload {
    pub robot_name: Option<String>,
    pub key: Option<String>,
}

/// Commands the console sends to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Ask the bridge to replay current state after (re)connecting
    InitRequest,
    /// Keep-alive
    Ping,
    CmdVel {
        linear: Vector3,
        angular: Vector3,
        gear: u8,
    },
    AutoSpeed {
        gear: u8,
    },
    UiCommand {
        command: String,
        timestamp: u64,
        command_id: String,
    },
    /// Stage label publish, echoed to every listening client
    RobotStatus {
        name: Option<String>,
        state: String,
    },
    /// Confirm the delivered stock move and release the robot home
    CompleteStockMove,
}

impl OutboundMessage {
    pub fn init_request() -> Self {
        Self::InitRequest
    }

    pub fn ping() -> Self {
        Self::Ping
    }

    /// Velocity command clamped to the gear's linear cap and +/-1.0 rad/s yaw.
    pub fn cmd_vel(linear_x: f64, angular_z: f64, gear: u8) -> Self {
        let cap = gear_cap(gear);
        Self::CmdVel {
            linear: Vector3 {
                x: linear_x.clamp(-cap, cap),
                y: 0.0,
                z: 0.0,
            },
            angular: Vector3 {
                x: 0.0,
                y: 0.0,
                z: angular_z.clamp(-1.0, 1.0),
            },
            gear,
        }
    }

    /// Immediate zero twist at gear 0.
    pub fn emergency_stop() -> Self {
        Self::CmdVel {
            linear: Vector3::default(),
            angular: Vector3::default(),
            gear: 0,
        }
    }

    pub fn auto_speed(gear: u8) -> Self {
        Self::AutoSpeed { gear }
    }

    pub fn move_to_pin(pin: &str) -> Self {
        Self::UiCommand {
            command: format!("MOVE_TO_PIN {pin}"),
            timestamp: now_millis(),
            command_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Send the robot back to its base. The sentinel doubles as the
    /// command word on the wire.
    pub fn return_home(home_pin: &str) -> Self {
        Self::UiCommand {
            command: home_pin.to_string(),
            timestamp: now_millis(),
            command_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn publish_status(name: Option<String>, state: &str) -> Self {
        Self::RobotStatus {
            name,
            state: state.to_string(),
        }
    }

    pub fn complete_stock_move() -> Self {
        Self::CompleteStockMove
    }

    pub fn to_frame(&self) -> eyre::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
