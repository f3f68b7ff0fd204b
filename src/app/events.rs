//! Outbound application events.
//!
//! The [`BridgeService`](super::service::BridgeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::DeviceError;
use crate::sensors::{BatterySnapshot, ReadFailure, Rejection};

use super::commands::RobotCommand;
use super::ports::RestartReason;

/// Which supervised link an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Network,
    Broker,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Links are up, presence announced, robot woken.
    Started,

    /// A link was down and came back within its budget.
    LinkRestored { link: Link, down_ms: u64 },

    /// The chip is about to reset.
    RestartRequested(RestartReason),

    /// A reading failed its plausibility bound and was discarded.
    ReadingRejected(Rejection),

    /// A sensor query produced no value.
    ReadFailed(ReadFailure),

    /// A remote command ran to completion on the robot.
    CommandHandled(RobotCommand),

    /// A remote command was cut short by a serial error.
    CommandFailed {
        command: RobotCommand,
        error: DeviceError,
    },

    /// Periodic telemetry snapshot, after publishing.
    Telemetry(BatterySnapshot),
}
