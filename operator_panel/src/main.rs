//! Picking panel client.
//!
//! Mirrors the robot's lifecycle stage from the socket feed and offers the
//! single operator affordance: confirming a delivered stock move, which
//! releases the robot back home.

use eyre::Result;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use wms_console_lib::{
    init_tracing, ConsoleConfig, Effect, InboundMessage, StageTracker,
};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

enum SessionEnd {
    Disconnected,
    Quit,
}

struct Panel {
    tracker: StageTracker,
    /// Robot named by the latest presence message
    robot_name: Option<String>,
    confirm_visible: bool,
}

impl Panel {
    fn new(config: &ConsoleConfig) -> Self {
        Self {
            tracker: StageTracker::new(config.stage_labels.clone()),
            robot_name: None,
            confirm_visible: false,
        }
    }
}

async fn apply_effects(panel: &mut Panel, sink: &mut WsSink, effects: Vec<Effect>) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::StatusText(text) => {
                tracing::info!(
                    robot = panel.robot_name.as_deref().unwrap_or("-"),
                    "status: {text}"
                );
            }
            Effect::ShowConfirm { label } => {
                panel.confirm_visible = true;
                tracing::info!("type '{label}' to complete the stock move");
            }
            Effect::HideConfirm => {
                panel.confirm_visible = false;
            }
            Effect::Send(msg) => {
                sink.send(Message::Text(msg.to_frame()?)).await?;
            }
        }
    }
    Ok(())
}

async fn run_panel(
    panel: &mut Panel,
    config: &ConsoleConfig,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<SessionEnd> {
    let (mut sink, mut stream) = socket.split();

    let mut ping = tokio::time::interval(Duration::from_millis(config.session.ping_interval_ms));
    ping.tick().await; // the first tick is immediate

    loop {
        tokio::select! {
            _ = ping.tick() => {
                sink.send(Message::Text(
                    wms_console_lib::OutboundMessage::ping().to_frame()?,
                ))
                .await?;
            }
            frame = stream.next() => {
                let Some(frame) = frame else {
                    return Ok(SessionEnd::Disconnected);
                };
                match frame? {
                    Message::Text(text) => {
                        if let Some(msg) = InboundMessage::parse(&text) {
                            if let InboundMessage::Status(p) = &msg {
                                if let Some(name) = &p.robot_name {
                                    panel.robot_name = Some(name.clone());
                                }
                            }
                            let effects = panel.tracker.handle(&msg);
                            apply_effects(panel, &mut sink, effects).await?;
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
                match line.trim() {
                    "" => {}
                    "confirm" => {
                        // Guarded inside the tracker: nothing goes out unless
                        // the robot has actually arrived.
                        let effects = panel.tracker.confirm();
                        if effects.is_empty() {
                            tracing::warn!("nothing to confirm right now");
                        }
                        apply_effects(panel, &mut sink, effects).await?;
                    }
                    "quit" | "exit" => return Ok(SessionEnd::Quit),
                    other => tracing::warn!(input = other, "unrecognized input, expected 'confirm'"),
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

    tracing::info!("picking panel starting");

    let mut panel = Panel::new(&config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match connect_async(&config.backend.ws_url).await {
            Ok((socket, _)) => {
                tracing::info!(url = %config.backend.ws_url, "websocket connected");
                match run_panel(&mut panel, &config, socket, &mut lines).await {
                    Ok(SessionEnd::Quit) => break,
                    Ok(SessionEnd::Disconnected) => {
                        tracing::warn!("websocket disconnected, retrying");
                    }
                    Err(err) => tracing::warn!(%err, "session error, retrying"),
                }
            }
            Err(err) => tracing::warn!(%err, "websocket connect failed, retrying"),
        }
        tokio::time::sleep(Duration::from_millis(config.session.reconnect_delay_ms)).await;
    }

    tracing::info!("picking panel shutting down");
    Ok(())
}
