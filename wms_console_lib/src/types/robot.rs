use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::messages::InboundMessage;

/// Latest pose reported for a robot, metric map frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RobotPose {
    pub x: f64,
    pub y: f64,
    /// Heading in radians, (-pi, pi]
    pub theta: f64,
}

/// Display state for one robot on the dashboard.
///
/// `mode` is the free-text status label shown to the operator; it is richer
/// than (and independent of) the four-value stage gating the confirm action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotCard {
    pub name: String,
    pub connected: bool,
    /// Charge, 0-100
    pub battery: f64,
    /// Signed linear speed, m/s
    pub speed: f64,
    /// Last known pose; `None` until one arrives and after a disconnect
    pub pose: Option<RobotPose>,
    pub mode: String,
}

pub const MODE_DISCONNECTED: &str = "disconnected";
pub const MODE_AUTO: &str = "auto";
pub const MODE_MANUAL: &str = "manual";

impl RobotCard {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connected: false,
            battery: 0.0,
            speed: 0.0,
            pose: None,
            mode: MODE_DISCONNECTED.to_string(),
        }
    }

    fn reset_telemetry(&mut self) {
        self.battery = 0.0;
        self.speed = 0.0;
        self.pose = None;
        self.mode = MODE_DISCONNECTED.to_string();
    }
}

/// Session-owned registry of robot cards.
///
/// One writer (the socket loop) mutates cards in place; cards are created
/// from the REST roster and never removed within a session. A disconnect
/// flips `connected` and clears telemetry, it does not drop the entry.
#[derive(Debug, Default)]
pub struct RobotBoard {
    robots: HashMap<String, RobotCard>,
}

impl RobotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed cards for every robot in the roster, keeping any existing card.
    pub fn init_roster<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        for name in names {
            self.robots
                .entry(name.clone())
                .or_insert_with(|| RobotCard::new(name));
        }
    }

    pub fn get(&self, name: &str) -> Option<&RobotCard> {
        self.robots.get(name)
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// Fold one inbound message into the addressed card. Messages without a
    /// robot name, or naming a robot outside the roster, are ignored.
    pub fn apply(&mut self, msg: &InboundMessage) {
        let Some(name) = msg.robot_name() else {
            return;
        };
        let Some(card) = self.robots.get_mut(name) else {
            tracing::debug!(robot = name, "message for robot outside the roster");
            return;
        };

        match msg {
            InboundMessage::Status(p) => {
                card.connected = p.connected;
                if p.connected {
                    card.mode = MODE_AUTO.to_string();
                } else {
                    card.reset_telemetry();
                }
            }
            InboundMessage::Battery(p) => {
                if let Some(level) = p.normalized_level() {
                    card.battery = level;
                }
            }
            InboundMessage::Odom(p) => {
                card.speed = p.linear.map(|l| l.x).unwrap_or(0.0);
                if let Some(pos) = p.position {
                    let theta = card.pose.map(|pose| pose.theta).unwrap_or(0.0);
                    card.pose = Some(RobotPose {
                        x: pos.x,
                        y: pos.y,
                        theta,
                    });
                }
            }
            InboundMessage::AmclPose(p) => {
                card.pose = Some(RobotPose {
                    x: p.x,
                    y: p.y,
                    theta: p.theta,
                });
            }
            InboundMessage::TeleopKey(p) => {
                let manual = p.key.as_deref().is_some_and(|k| !k.is_empty());
                card.mode = if manual { MODE_MANUAL } else { MODE_AUTO }.to_string();
            }
            _ => {}
        }
    }

    /// Cards for rendering: connected robots first, then by name.
    pub fn cards_sorted(&self) -> Vec<&RobotCard> {
        let mut cards: Vec<&RobotCard> = self.robots.values().collect();
        cards.sort_by(|a, b| {
            b.connected
                .cmp(&a.connected)
                .then_with(|| a.name.cmp(&b.name))
        });
        cards
    }
}
