//! Inbound remote commands.
//!
//! Payloads arriving on the command topic are parsed into [`RobotCommand`]
//! before anything acts on them, so the dispatcher works over a closed set
//! rather than raw text.

/// Actions the outside world can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotCommand {
    /// Start a cleaning cycle.
    Start,
    /// Stop cleaning and seek the dock.
    Dock,
    /// Power the robot off.
    PowerOff,
    /// Play the Imperial March.
    PlayAnthem,
    /// Restart the bridge itself.
    Restart,
}

impl RobotCommand {
    /// Match a payload verbatim: case-sensitive, no trimming.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            b"start" => Some(Self::Start),
            b"stop" => Some(Self::Dock),
            b"power" => Some(Self::PowerOff),
            b"imperial" => Some(Self::PlayAnthem),
            b"restart" => Some(Self::Restart),
            _ => None,
        }
    }

    /// Status published once the command reached the robot.
    pub fn status(self) -> Option<&'static str> {
        match self {
            Self::Start => Some("cleaning"),
            Self::Dock => Some("dock"),
            Self::PowerOff => Some("power"),
            Self::PlayAnthem | Self::Restart => None,
        }
    }
}
