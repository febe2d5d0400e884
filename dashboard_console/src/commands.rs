//! Operator command line for the dashboard console.

/// Control mode of the selected robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Dispatch the robot to a named pin
    MoveToPin(String),
    /// Send the robot back to base
    ReturnHome,
    EmergencyStop,
    /// Switch the speed gear (1-3)
    Gear(u8),
    Mode(ControlMode),
    /// Hold a manual drive direction
    Drive(DriveDirection),
    /// Release the held direction
    Halt,
    /// Select the active robot by name (connects through the backend)
    Select(String),
    /// Register a robot with the backend: name then ip
    AddRobot(String, String),
    /// Remove a robot from the backend roster by name
    RemoveRobot(String),
    /// Print the status cards
    Roster,
    Quit,
}

/// Parse one operator input line. Unknown input yields `None`; the caller
/// logs it and moves on.
pub fn parse_line(line: &str) -> Option<ConsoleCommand> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();

    match head.as_str() {
        "move" => parts.next().map(|p| ConsoleCommand::MoveToPin(p.to_string())),
        "return" => Some(ConsoleCommand::ReturnHome),
        "stop" | "estop" => Some(ConsoleCommand::EmergencyStop),
        "gear" => parts
            .next()?
            .parse::<u8>()
            .ok()
            .filter(|g| (1..=3).contains(g))
            .map(ConsoleCommand::Gear),
        "mode" => match parts.next()? {
            "auto" => Some(ConsoleCommand::Mode(ControlMode::Auto)),
            "manual" => Some(ConsoleCommand::Mode(ControlMode::Manual)),
            _ => None,
        },
        "w" | "forward" => Some(ConsoleCommand::Drive(DriveDirection::Forward)),
        "s" | "backward" => Some(ConsoleCommand::Drive(DriveDirection::Backward)),
        "a" | "left" => Some(ConsoleCommand::Drive(DriveDirection::Left)),
        "d" | "right" => Some(ConsoleCommand::Drive(DriveDirection::Right)),
        "x" | "halt" => Some(ConsoleCommand::Halt),
        "select" => parts.next().map(|n| ConsoleCommand::Select(n.to_string())),
        "add" => {
            let name = parts.next()?.to_string();
            let ip = parts.next()?.to_string();
            Some(ConsoleCommand::AddRobot(name, ip))
        }
        "remove" => parts.next().map(|n| ConsoleCommand::RemoveRobot(n.to_string())),
        "roster" | "cards" => Some(ConsoleCommand::Roster),
        "quit" | "exit" => Some(ConsoleCommand::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dispatch_commands() {
        assert_eq!(
            parse_line("move A-03"),
            Some(ConsoleCommand::MoveToPin("A-03".to_string()))
        );
        assert_eq!(parse_line("return"), Some(ConsoleCommand::ReturnHome));
        assert_eq!(parse_line("estop"), Some(ConsoleCommand::EmergencyStop));
    }

    #[test]
    fn gear_accepts_only_the_known_range() {
        assert_eq!(parse_line("gear 2"), Some(ConsoleCommand::Gear(2)));
        assert_eq!(parse_line("gear 0"), None);
        assert_eq!(parse_line("gear 4"), None);
        assert_eq!(parse_line("gear fast"), None);
        assert_eq!(parse_line("gear"), None);
    }

    #[test]
    fn mode_and_drive_keys() {
        assert_eq!(
            parse_line("mode manual"),
            Some(ConsoleCommand::Mode(ControlMode::Manual))
        );
        assert_eq!(
            parse_line("w"),
            Some(ConsoleCommand::Drive(DriveDirection::Forward))
        );
        assert_eq!(parse_line("x"), Some(ConsoleCommand::Halt));
    }

    #[test]
    fn roster_management_needs_all_arguments() {
        assert_eq!(
            parse_line("add wasd-2 10.0.0.8"),
            Some(ConsoleCommand::AddRobot(
                "wasd-2".to_string(),
                "10.0.0.8".to_string()
            ))
        );
        assert_eq!(parse_line("add wasd-2"), None);
        assert_eq!(
            parse_line("remove wasd-2"),
            Some(ConsoleCommand::RemoveRobot("wasd-2".to_string()))
        );
        assert_eq!(parse_line("remove"), None);
    }

    #[test]
    fn input_is_case_insensitive_on_the_verb() {
        assert_eq!(
            parse_line("MOVE A-03"),
            Some(ConsoleCommand::MoveToPin("A-03".to_string()))
        );
    }

    #[test]
    fn junk_lines_yield_none() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("launch"), None);
        assert_eq!(parse_line("move"), None);
    }
}
