use eyre::Result;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use wms_console_lib::{
    gear_cap, init_tracing, ConsoleConfig, InboundMessage, OutboundMessage, PixelPoint,
    PoseProjector, RobotBoard, Viewport,
};

mod api;
mod commands;
mod render;

use api::BackendClient;
use commands::{ConsoleCommand, ControlMode, DriveDirection};

// Manual drive ramp: step per tick toward the gear cap, fixed yaw rate.
const ACCEL_STEP: f64 = 0.03;
const ACCEL_TICK_MS: u64 = 70;
const BASE_ANGULAR: f64 = 0.6;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Held-direction acceleration state for manual drive.
#[derive(Default)]
struct TeleopState {
    direction: Option<DriveDirection>,
    linear: f64,
    angular: f64,
}

impl TeleopState {
    fn start(&mut self, direction: DriveDirection) {
        self.direction = Some(direction);
    }

    /// Release the held direction. Returns true when a direction was active
    /// and a zero-velocity command should go out.
    fn stop(&mut self) -> bool {
        let was_active = self.direction.is_some();
        self.direction = None;
        self.linear = 0.0;
        self.angular = 0.0;
        was_active
    }

    fn is_active(&self) -> bool {
        self.direction.is_some()
    }

    /// One ramp tick toward the gear cap.
    fn tick(&mut self, gear: u8) -> Option<(f64, f64)> {
        let direction = self.direction?;
        let cap = gear_cap(gear);
        match direction {
            DriveDirection::Forward => self.linear = (self.linear + ACCEL_STEP).min(cap),
            DriveDirection::Backward => self.linear = (self.linear - ACCEL_STEP).max(-cap),
            DriveDirection::Left => self.angular = BASE_ANGULAR,
            DriveDirection::Right => self.angular = -BASE_ANGULAR,
        }
        Some((self.linear, self.angular))
    }
}

enum SessionEnd {
    Disconnected,
    Quit,
}

struct Dashboard {
    config: ConsoleConfig,
    backend: BackendClient,
    roster: Vec<api::Robot>,
    board: RobotBoard,
    projector: Option<PoseProjector>,
    viewport: Viewport,
    gear: u8,
    mode: ControlMode,
    teleop: TeleopState,
    /// Robot most recently reported by a presence message
    active_robot: Option<String>,
}

async fn send(sink: &mut WsSink, msg: &OutboundMessage) -> Result<()> {
    sink.send(Message::Text(msg.to_frame()?)).await?;
    Ok(())
}

fn handle_inbound(dash: &mut Dashboard, msg: &InboundMessage) {
    dash.board.apply(msg);

    match msg {
        InboundMessage::Status(p) => {
            if let Some(name) = &p.robot_name {
                dash.active_robot = Some(name.clone());
            }
            tracing::info!("\n{}", render::render_cards(&dash.board));
        }
        InboundMessage::Battery(_) | InboundMessage::Odom(_) | InboundMessage::TeleopKey(_) => {
            tracing::info!("\n{}", render::render_cards(&dash.board));
        }
        InboundMessage::AmclPose(p) => {
            if let Some(projector) = &dash.projector {
                let point = projector.project(&dash.viewport, p.x, p.y);
                if point != PixelPoint::ORIGIN {
                    let name = p.robot_name.as_deref().unwrap_or("robot");
                    let heading = PoseProjector::heading_degrees(p.theta);
                    tracing::info!("{}", render::render_marker(name, point, heading));
                }
            }
        }
        InboundMessage::RobotStatus(p) => {
            tracing::info!(robot = p.robot().unwrap_or("-"), state = %p.state, "stage broadcast");
        }
        InboundMessage::RobotArrived(p) => {
            tracing::info!(pin = %p.pin, "robot arrived");
        }
        InboundMessage::Diagnostics(p) => {
            tracing::info!(
                status = p.status.as_deref().unwrap_or("-"),
                "system diagnostics"
            );
        }
    }
}

async fn handle_command(
    dash: &mut Dashboard,
    sink: &mut WsSink,
    cmd: ConsoleCommand,
) -> Result<Option<SessionEnd>> {
    match cmd {
        ConsoleCommand::MoveToPin(pin) => {
            send(
                sink,
                &OutboundMessage::publish_status(
                    dash.active_robot.clone(),
                    &dash.config.stage_labels.moving,
                ),
            )
            .await?;
            send(sink, &OutboundMessage::move_to_pin(&pin)).await?;
            tracing::info!(%pin, "dispatch command sent");
        }
        ConsoleCommand::ReturnHome => {
            send(
                sink,
                &OutboundMessage::publish_status(
                    dash.active_robot.clone(),
                    &dash.config.stage_labels.returning,
                ),
            )
            .await?;
            send(
                sink,
                &OutboundMessage::return_home(&dash.config.stage_labels.home_pin),
            )
            .await?;
            tracing::info!("return command sent");
        }
        ConsoleCommand::EmergencyStop => {
            dash.teleop.stop();
            send(sink, &OutboundMessage::emergency_stop()).await?;
            send(
                sink,
                &OutboundMessage::publish_status(
                    dash.active_robot.clone(),
                    &dash.config.stage_labels.emergency,
                ),
            )
            .await?;
            tracing::info!("emergency stop sent");
        }
        ConsoleCommand::Gear(gear) => {
            dash.gear = gear;
            tracing::info!(gear, cap = gear_cap(gear), "gear changed");
            if dash.mode == ControlMode::Auto {
                send(sink, &OutboundMessage::auto_speed(gear)).await?;
            }
        }
        ConsoleCommand::Mode(mode) => {
            dash.mode = mode;
            if dash.teleop.stop() {
                send(sink, &OutboundMessage::cmd_vel(0.0, 0.0, dash.gear)).await?;
            }
            match mode {
                ControlMode::Auto => {
                    send(sink, &OutboundMessage::auto_speed(dash.gear)).await?;
                    tracing::info!("auto mode");
                }
                ControlMode::Manual => tracing::info!("manual mode, drive with w/a/s/d, x to halt"),
            }
        }
        ConsoleCommand::Drive(direction) => {
            if dash.mode == ControlMode::Manual {
                dash.teleop.start(direction);
            } else {
                tracing::warn!("drive keys need manual mode");
            }
        }
        ConsoleCommand::Halt => {
            if dash.teleop.stop() {
                send(sink, &OutboundMessage::cmd_vel(0.0, 0.0, dash.gear)).await?;
            }
        }
        ConsoleCommand::Select(name) => match dash.roster.iter().find(|r| r.name == name) {
            Some(robot) => match dash.backend.connect_robot(robot.id).await {
                Ok(ack) => {
                    dash.active_robot = Some(robot.name.clone());
                    tracing::info!(robot = %robot.name, "{}", ack.message);
                }
                Err(err) => tracing::warn!(robot = %robot.name, %err, "bridge connect failed"),
            },
            None => tracing::warn!(%name, "no such robot in the roster"),
        },
        ConsoleCommand::AddRobot(name, ip) => match dash.backend.create_robot(&name, &ip).await {
            Ok(robot) => {
                dash.board.init_roster([robot.name.clone()]);
                tracing::info!(robot = %robot.name, ip = %robot.ip, "robot registered");
                dash.roster.push(robot);
            }
            Err(err) => tracing::warn!(%name, %err, "robot registration failed"),
        },
        ConsoleCommand::RemoveRobot(name) => {
            match dash.roster.iter().position(|r| r.name == name) {
                Some(idx) => {
                    let robot = dash.roster.remove(idx);
                    match dash.backend.delete_robot(robot.id).await {
                        // The board card stays for the rest of the session;
                        // the next restart reseeds from the roster.
                        Ok(()) => tracing::info!(robot = %robot.name, "robot removed"),
                        Err(err) => {
                            tracing::warn!(robot = %robot.name, %err, "robot removal failed");
                            dash.roster.push(robot);
                        }
                    }
                }
                None => tracing::warn!(%name, "no such robot in the roster"),
            }
        }
        ConsoleCommand::Roster => {
            tracing::info!("\n{}", render::render_cards(&dash.board));
        }
        ConsoleCommand::Quit => return Ok(Some(SessionEnd::Quit)),
    }
    Ok(None)
}

async fn run_session(
    dash: &mut Dashboard,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<SessionEnd> {
    let (mut sink, mut stream) = socket.split();

    send(&mut sink, &OutboundMessage::init_request()).await?;

    let mut ping = tokio::time::interval(Duration::from_millis(dash.config.session.ping_interval_ms));
    ping.tick().await; // the first tick is immediate
    let mut drive_tick = tokio::time::interval(Duration::from_millis(ACCEL_TICK_MS));

    loop {
        tokio::select! {
            _ = ping.tick() => {
                send(&mut sink, &OutboundMessage::ping()).await?;
            }
            _ = drive_tick.tick(), if dash.teleop.is_active() && dash.mode == ControlMode::Manual => {
                if let Some((linear, angular)) = dash.teleop.tick(dash.gear) {
                    send(&mut sink, &OutboundMessage::cmd_vel(linear, angular, dash.gear)).await?;
                }
            }
            frame = stream.next() => {
                let Some(frame) = frame else {
                    return Ok(SessionEnd::Disconnected);
                };
                match frame? {
                    Message::Text(text) => {
                        if let Some(msg) = InboundMessage::parse(&text) {
                            handle_inbound(dash, &msg);
                        }
                    }
                    Message::Close(_) => return Ok(SessionEnd::Disconnected),
                    _ => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(SessionEnd::Quit);
                };
                if line.trim().is_empty() {
                    continue;
                }
                match commands::parse_line(&line) {
                    Some(cmd) => {
                        if let Some(end) = handle_command(dash, &mut sink, cmd).await? {
                            return Ok(end);
                        }
                    }
                    None => tracing::warn!(input = %line.trim(), "unrecognized command"),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_tracing();

    let config = ConsoleConfig::load()?;
    config.validate()?;

    tracing::info!("WMS dashboard console starting");
    let backend = BackendClient::new(config.backend.api_url.clone());

    let roster = backend.robots().await?;
    tracing::info!(robots = roster.len(), "roster loaded");

    let mut board = RobotBoard::new();
    board.init_roster(roster.iter().map(|r| r.name.clone()));

    match backend.pins().await {
        Ok(pins) => tracing::info!(pins = pins.len(), "pins loaded"),
        Err(err) => tracing::warn!(%err, "pin list unavailable"),
    }
    match backend.stocks().await {
        Ok(stocks) => tracing::info!(stocks = stocks.len(), "stocks loaded"),
        Err(err) => tracing::warn!(%err, "stock list unavailable"),
    }

    // Reconnect the bridge to the first roster robot, mirroring the page
    // restore flow, and surface its current connection state.
    let mut active_robot = None;
    if let Some(robot) = roster.first() {
        match backend.connect_robot(robot.id).await {
            Ok(ack) => {
                active_robot = Some(robot.name.clone());
                tracing::info!(robot = %robot.name, "{}", ack.message);
            }
            Err(err) => tracing::warn!(robot = %robot.name, %err, "bridge connect failed"),
        }
        match backend.robot_status(robot.id).await {
            Ok(state) => tracing::info!(robot = %robot.name, connected = state.connected, "bridge state"),
            Err(err) => tracing::warn!(%err, "bridge state unavailable"),
        }
    }

    let mut viewport = Viewport::new(
        config.map_view.container_width,
        config.map_view.container_height,
    );
    let projector = match backend.map_info().await {
        Ok(calibration) => {
            match backend.map_natural_size(&calibration).await {
                Ok((width, height)) => {
                    viewport = viewport.with_natural_size(width as f64, height as f64);
                    tracing::info!(width, height, "map raster loaded");
                }
                Err(err) => {
                    tracing::warn!(%err, "map raster unavailable, marker projection disabled");
                }
            }
            Some(PoseProjector::new(calibration, config.correction.clone()))
        }
        Err(err) => {
            tracing::warn!(%err, "map descriptor unavailable, marker projection disabled");
            None
        }
    };

    let mut dash = Dashboard {
        config,
        backend,
        roster,
        board,
        projector,
        viewport,
        gear: 1,
        mode: ControlMode::Auto,
        teleop: TeleopState::default(),
        active_robot,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match connect_async(&dash.config.backend.ws_url).await {
            Ok((socket, _)) => {
                tracing::info!(url = %dash.config.backend.ws_url, "websocket connected");
                match run_session(&mut dash, socket, &mut lines).await {
                    Ok(SessionEnd::Quit) => break,
                    Ok(SessionEnd::Disconnected) => {
                        tracing::warn!("websocket disconnected, retrying");
                    }
                    Err(err) => tracing::warn!(%err, "session error, retrying"),
                }
            }
            Err(err) => tracing::warn!(%err, "websocket connect failed, retrying"),
        }
        tokio::time::sleep(Duration::from_millis(
            dash.config.session.reconnect_delay_ms,
        ))
        .await;
    }

    tracing::info!("dashboard console shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teleop_ramps_toward_the_gear_cap() {
        let mut teleop = TeleopState::default();
        teleop.start(DriveDirection::Forward);

        let mut last = 0.0;
        for _ in 0..10 {
            let (linear, _) = teleop.tick(1).unwrap();
            assert!(linear <= gear_cap(1));
            assert!(linear >= last);
            last = linear;
        }
        assert_eq!(last, gear_cap(1));
    }

    #[test]
    fn releasing_resets_the_ramp() {
        let mut teleop = TeleopState::default();
        assert!(!teleop.stop());

        teleop.start(DriveDirection::Backward);
        teleop.tick(2);
        assert!(teleop.stop());
        assert!(!teleop.is_active());
        assert_eq!(teleop.tick(2), None);
        assert_eq!(teleop.linear, 0.0);
    }

    #[test]
    fn turn_directions_set_the_fixed_yaw_rate() {
        let mut teleop = TeleopState::default();
        teleop.start(DriveDirection::Left);
        assert_eq!(teleop.tick(3), Some((0.0, BASE_ANGULAR)));

        teleop.start(DriveDirection::Right);
        assert_eq!(teleop.tick(3), Some((0.0, -BASE_ANGULAR)));
    }
}
