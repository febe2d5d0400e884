//! Robot lifecycle stage tracker.
//!
//! A reducer over the inbound message feed: each message yields the next
//! stage plus a list of side-effect requests (status text, confirm-action
//! visibility, outbound commands). The caller owns the socket and the
//! display; the tracker only decides. Stage is server-driven except for the
//! single optimistic `Arrived -> Returning` transition on operator confirm.

use serde::{Deserialize, Serialize};

use crate::types::{InboundMessage, OutboundMessage, StageLabels, StageClass};

/// Coarse four-value lifecycle stage gating the operator confirm action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotStage {
    Idle,
    Moving,
    Arrived,
    Returning,
}

/// Operator-facing status text values.
pub const STATUS_WAITING: &str = "waiting";
pub const STATUS_MOVING: &str = "moving";
pub const STATUS_RETURNING: &str = "returning";
pub const STATUS_ARRIVED: &str = "arrived";
pub const CONFIRM_LABEL: &str = "confirm";

/// Side effects requested by a transition, applied by the caller in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StatusText(&'static str),
    ShowConfirm { label: &'static str },
    HideConfirm,
    Send(OutboundMessage),
}

pub struct StageTracker {
    stage: RobotStage,
    labels: StageLabels,
}

impl StageTracker {
    pub fn new(labels: StageLabels) -> Self {
        Self {
            stage: RobotStage::Idle,
            labels,
        }
    }

    pub fn stage(&self) -> RobotStage {
        self.stage
    }

    /// Fold one inbound message into the stage. Messages that carry no stage
    /// meaning (telemetry, diagnostics, unknown labels) leave it unchanged
    /// and request nothing. Rapid contradictory broadcasts resolve
    /// last-write-wins; there is no buffering and no timer expiry.
    pub fn handle(&mut self, msg: &InboundMessage) -> Vec<Effect> {
        match msg {
            InboundMessage::Status(p) if !p.connected => self.enter_idle(),
            InboundMessage::RobotStatus(p) => match self.labels.classify(&p.state) {
                Some(StageClass::Moving) => {
                    self.stage = RobotStage::Moving;
                    vec![Effect::HideConfirm, Effect::StatusText(STATUS_MOVING)]
                }
                Some(StageClass::Returning) => {
                    self.stage = RobotStage::Returning;
                    vec![Effect::HideConfirm, Effect::StatusText(STATUS_RETURNING)]
                }
                Some(StageClass::Waiting) => self.enter_idle(),
                None => {
                    tracing::warn!(label = %p.state, "stage label outside the configured vocabulary");
                    Vec::new()
                }
            },
            InboundMessage::RobotArrived(p) => {
                if self.labels.is_home(&p.pin) {
                    // Back at base: the arrival closes the cycle
                    self.enter_idle()
                } else {
                    self.stage = RobotStage::Arrived;
                    vec![
                        Effect::ShowConfirm {
                            label: CONFIRM_LABEL,
                        },
                        Effect::StatusText(STATUS_ARRIVED),
                    ]
                }
            }
            _ => Vec::new(),
        }
    }

    /// Operator confirm. Guarded: a no-op unless the stage is `Arrived`, so
    /// stale or duplicate clicks after the server has moved on send nothing.
    /// Optimistic: flips to `Returning` before any acknowledgment; the next
    /// authoritative broadcast is the only resync path.
    pub fn confirm(&mut self) -> Vec<Effect> {
        if self.stage != RobotStage::Arrived {
            return Vec::new();
        }
        self.stage = RobotStage::Returning;
        vec![
            Effect::Send(OutboundMessage::complete_stock_move()),
            Effect::HideConfirm,
            Effect::StatusText(STATUS_RETURNING),
        ]
    }

    fn enter_idle(&mut self) -> Vec<Effect> {
        self.stage = RobotStage::Idle;
        vec![Effect::HideConfirm, Effect::StatusText(STATUS_WAITING)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        RobotArrivedPayload, RobotStatusPayload, StatusPayload,
    };

    fn tracker() -> StageTracker {
        StageTracker::new(StageLabels::default())
    }

    fn broadcast(state: &str) -> InboundMessage {
        InboundMessage::RobotStatus(RobotStatusPayload {
            state: state.to_string(),
            robot_name: Some("wasd-1".to_string()),
            name: None,
        })
    }

    fn arrived(pin: &str) -> InboundMessage {
        InboundMessage::RobotArrived(RobotArrivedPayload {
            pin: pin.to_string(),
            robot_name: Some("wasd-1".to_string()),
        })
    }

    fn disconnected() -> InboundMessage {
        InboundMessage::Status(StatusPayload {
            robot_name: Some("wasd-1".to_string()),
            ip: None,
            connected: false,
        })
    }

    #[test]
    fn starts_idle() {
        assert_eq!(tracker().stage(), RobotStage::Idle);
    }

    #[test]
    fn confirm_outside_arrived_is_a_no_op() {
        // Idle
        let mut t = tracker();
        assert!(t.confirm().is_empty());
        assert_eq!(t.stage(), RobotStage::Idle);

        // Moving
        let mut t = tracker();
        t.handle(&broadcast("moving"));
        assert!(t.confirm().is_empty());
        assert_eq!(t.stage(), RobotStage::Moving);

        // Returning
        let mut t = tracker();
        t.handle(&broadcast("returning"));
        assert!(t.confirm().is_empty());
        assert_eq!(t.stage(), RobotStage::Returning);
    }

    #[test]
    fn arrival_branches_on_home_sentinel() {
        let mut t = tracker();
        let effects = t.handle(&arrived("A-07"));
        assert_eq!(t.stage(), RobotStage::Arrived);
        assert!(effects.contains(&Effect::ShowConfirm {
            label: CONFIRM_LABEL
        }));
        assert!(effects.contains(&Effect::StatusText(STATUS_ARRIVED)));

        let mut t = tracker();
        let effects = t.handle(&arrived("WAIT"));
        assert_eq!(t.stage(), RobotStage::Idle);
        assert!(effects.contains(&Effect::HideConfirm));
        assert!(effects.contains(&Effect::StatusText(STATUS_WAITING)));
    }

    #[test]
    fn confirm_sends_the_completion_once() {
        let mut t = tracker();
        t.handle(&arrived("A-07"));

        let effects = t.confirm();
        assert_eq!(t.stage(), RobotStage::Returning);
        assert!(effects.contains(&Effect::Send(OutboundMessage::complete_stock_move())));
        assert!(effects.contains(&Effect::HideConfirm));
        assert!(effects.contains(&Effect::StatusText(STATUS_RETURNING)));

        // A duplicate click after the optimistic transition sends nothing
        assert!(t.confirm().is_empty());
        assert_eq!(t.stage(), RobotStage::Returning);
    }

    #[test]
    fn contradictory_broadcasts_resolve_last_write_wins() {
        let mut t = tracker();
        t.handle(&broadcast("moving"));
        t.handle(&broadcast("returning"));
        assert_eq!(t.stage(), RobotStage::Returning);

        t.handle(&broadcast("waiting"));
        assert_eq!(t.stage(), RobotStage::Idle);
    }

    #[test]
    fn disconnect_forces_idle_from_any_stage() {
        for seed in ["moving", "returning"] {
            let mut t = tracker();
            t.handle(&broadcast(seed));
            let effects = t.handle(&disconnected());
            assert_eq!(t.stage(), RobotStage::Idle);
            assert!(effects.contains(&Effect::HideConfirm));
            assert!(effects.contains(&Effect::StatusText(STATUS_WAITING)));
        }

        let mut t = tracker();
        t.handle(&arrived("A-07"));
        t.handle(&disconnected());
        assert_eq!(t.stage(), RobotStage::Idle);
    }

    #[test]
    fn unknown_labels_leave_the_stage_unchanged() {
        let mut t = tracker();
        t.handle(&broadcast("moving"));
        let effects = t.handle(&broadcast("defragmenting"));
        assert!(effects.is_empty());
        assert_eq!(t.stage(), RobotStage::Moving);
    }

    #[test]
    fn telemetry_messages_carry_no_stage_meaning() {
        let mut t = tracker();
        t.handle(&arrived("A-07"));
        let msg = InboundMessage::parse(
            r#"{"type":"amcl_pose","payload":{"x":1.0,"y":2.0,"theta":0.1}}"#,
        )
        .unwrap();
        assert!(t.handle(&msg).is_empty());
        assert_eq!(t.stage(), RobotStage::Arrived);
    }
}
