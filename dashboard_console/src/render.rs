//! Terminal rendering of the dashboard widgets.

use wms_console_lib::{
    speed_gauge_band, speed_gauge_percent, GaugeBand, PixelPoint, RobotBoard, RobotCard,
    LOW_BATTERY_THRESHOLD,
};

const BAR_WIDTH: usize = 10;

fn bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled))
}

fn band_name(band: GaugeBand) -> &'static str {
    match band {
        GaugeBand::Low => "low",
        GaugeBand::Mid => "mid",
        GaugeBand::High => "high",
    }
}

/// One status card as a single line.
pub fn card_line(card: &RobotCard) -> String {
    let presence = if card.connected { "ONLINE " } else { "OFFLINE" };

    let battery_mark = if card.connected && card.battery < LOW_BATTERY_THRESHOLD {
        " LOW"
    } else {
        ""
    };

    let position = match card.pose {
        Some(pose) => format!("({:.2}, {:.2})", pose.x, pose.y),
        None => "( - , - )".to_string(),
    };

    let speed_percent = speed_gauge_percent(card.speed);

    format!(
        "{:<12} {} battery {} {:>3.0}%{}  speed {} {:.2} m/s ({})  pos {}  mode {}",
        card.name,
        presence,
        bar(card.battery, BAR_WIDTH),
        card.battery,
        battery_mark,
        bar(speed_percent, BAR_WIDTH),
        card.speed.abs(),
        band_name(speed_gauge_band(speed_percent)),
        position,
        card.mode,
    )
}

/// All cards, connected robots first.
pub fn render_cards(board: &RobotBoard) -> String {
    board
        .cards_sorted()
        .into_iter()
        .map(card_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Marker line for the map view.
pub fn render_marker(name: &str, point: PixelPoint, heading_deg: f64) -> String {
    format!(
        "{name} marker at ({:.1}px, {:.1}px) heading {:.1} deg",
        point.x, point.y, heading_deg
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_console_lib::{InboundMessage, RobotCard};

    #[test]
    fn disconnected_card_shows_placeholders() {
        let card = RobotCard::new("wasd-1");
        let line = card_line(&card);
        assert!(line.contains("OFFLINE"));
        assert!(line.contains("( - , - )"));
        assert!(line.contains("0.00 m/s"));
        // The low-battery alert only applies to connected robots
        assert!(!line.contains("LOW"));
    }

    #[test]
    fn low_battery_is_flagged_when_connected() {
        let mut board = RobotBoard::new();
        board.init_roster(["wasd-1".to_string()]);
        for raw in [
            r#"{"type":"status","payload":{"robot_name":"wasd-1","connected":true}}"#,
            r#"{"type":"battery","payload":{"robot_name":"wasd-1","percentage":0.12}}"#,
        ] {
            board.apply(&InboundMessage::parse(raw).unwrap());
        }
        let line = card_line(board.get("wasd-1").unwrap());
        assert!(line.contains("ONLINE"));
        assert!(line.contains("12%"));
        assert!(line.contains("LOW"));
    }

    #[test]
    fn bar_fill_is_bounded() {
        assert_eq!(bar(0.0, 4), "[    ]");
        assert_eq!(bar(100.0, 4), "[####]");
        assert_eq!(bar(250.0, 4), "[####]");
        assert_eq!(bar(50.0, 4), "[##  ]");
    }
}
