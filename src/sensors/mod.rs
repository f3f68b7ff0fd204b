//! Battery sensor acquisition and plausibility filtering.
//!
//! [`BatteryMonitor`] queries the five battery channels through the
//! [`RoombaDriver`] and commits each reading only if it passes its
//! [`PlausibilityLimits`] bound.  The OI link occasionally returns garbage
//! frames (implausibly large integers); those are rejected and reported,
//! and the channel keeps its last good value.  A read that fails outright
//! also keeps the last good value, so a flaky link never blanks telemetry.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::SerialPort;
use crate::config::PlausibilityLimits;
use crate::drivers::roomba::{RoombaDriver, SensorPacket};
use crate::error::DeviceError;

/// One battery quantity tracked by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Capacity,
    Charge,
    ChargingState,
    Voltage,
    Current,
}

impl Channel {
    /// Sampling order.
    pub const ALL: [Channel; 5] = [
        Self::Capacity,
        Self::Charge,
        Self::ChargingState,
        Self::Voltage,
        Self::Current,
    ];

    pub const fn packet(self) -> SensorPacket {
        match self {
            Self::Capacity => SensorPacket::Capacity,
            Self::Charge => SensorPacket::Charge,
            Self::ChargingState => SensorPacket::ChargingState,
            Self::Voltage => SensorPacket::Voltage,
            Self::Current => SensorPacket::Current,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Capacity => "Capacity",
            Self::Charge => "Charge",
            Self::ChargingState => "Charging state",
            Self::Voltage => "Voltage",
            Self::Current => "Current",
        }
    }
}

/// Charging-state codes reported by packet 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChargingState {
    NotCharging = 0,
    Reconditioning = 1,
    FullCharging = 2,
    Trickle = 3,
    Waiting = 4,
    Fault = 5,
}

impl ChargingState {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NotCharging),
            1 => Some(Self::Reconditioning),
            2 => Some(Self::FullCharging),
            3 => Some(Self::Trickle),
            4 => Some(Self::Waiting),
            5 => Some(Self::Fault),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotCharging => "not charging",
            Self::Reconditioning => "reconditioning",
            Self::FullCharging => "full charging",
            Self::Trickle => "trickle",
            Self::Waiting => "waiting",
            Self::Fault => "fault",
        }
    }
}

// ---------------------------------------------------------------------------
// Committed values
// ---------------------------------------------------------------------------

/// Last accepted value of every channel plus the derived percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatterySnapshot {
    pub capacity_mah: u16,
    pub charge_mah: u16,
    pub charging_state: u8,
    pub voltage_v: f32,
    pub current_ma: i16,
    pub percentage: f32,
}

impl BatterySnapshot {
    /// Decoded view of the committed packet 21 code.
    pub fn charging_state(&self) -> Option<ChargingState> {
        ChargingState::from_code(self.charging_state)
    }
}

/// Charge as a percentage of capacity; 0 when capacity is unknown.
pub fn percentage(charge_mah: u16, capacity_mah: u16) -> f32 {
    if capacity_mah == 0 {
        return 0.0;
    }
    f32::from(charge_mah) / f32::from(capacity_mah) * 100.0
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// A decoded reading that failed its plausibility bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rejection {
    pub channel: Channel,
    pub value: Reading,
}

/// A decoded value in the channel's unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Unsigned(u16),
    Signed(i16),
    Volts(f32),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Volts(v) => write!(f, "{v:.2}"),
        }
    }
}

impl fmt::Display for Rejection {
    /// `"<Channel> : <value>"`, the diagnostic topic format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.channel.label(), self.value)
    }
}

/// A query that produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadFailure {
    pub channel: Channel,
    pub error: DeviceError,
}

/// Outcome of one [`BatteryMonitor::sample_all`] cycle.
#[derive(Debug, Clone, Default)]
pub struct SampleReport {
    pub rejected: heapless::Vec<Rejection, 5>,
    pub failed: heapless::Vec<ReadFailure, 5>,
    /// The wake-up `start` before the queries did not go out.
    pub wake_failed: Option<DeviceError>,
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub struct BatteryMonitor {
    limits: PlausibilityLimits,
    values: BatterySnapshot,
}

impl BatteryMonitor {
    pub fn new(limits: PlausibilityLimits) -> Self {
        Self {
            limits,
            values: BatterySnapshot::default(),
        }
    }

    /// Current committed values.
    pub fn snapshot(&self) -> BatterySnapshot {
        self.values
    }

    /// Wake the robot, then query every channel in [`Channel::ALL`] order.
    pub fn sample_all<S: SerialPort>(
        &mut self,
        driver: &mut RoombaDriver<S>,
        delay: &mut impl DelayNs,
    ) -> SampleReport {
        let mut report = SampleReport::default();

        if let Err(error) = driver.start(delay) {
            warn!("READ | wake failed: {}", error);
            report.wake_failed = Some(error);
        }

        for channel in Channel::ALL {
            match driver.query(channel.packet(), delay) {
                Ok(raw) => {
                    if let Err(rejection) = self.apply(channel, raw) {
                        warn!("READ | rejected {}", rejection);
                        let _ = report.rejected.push(rejection);
                    }
                }
                Err(error) => {
                    warn!("READ | {} failed: {}", channel.label(), error);
                    let _ = report.failed.push(ReadFailure { channel, error });
                }
            }

            if channel == Channel::Charge {
                self.values.percentage =
                    percentage(self.values.charge_mah, self.values.capacity_mah);
            }
        }

        debug!("READ | cycle done: {:?}", self.values);
        report
    }

    /// Validate one raw packet value and commit it if plausible.
    pub fn apply(&mut self, channel: Channel, raw: u16) -> Result<(), Rejection> {
        let limits = self.limits;
        let reject = |value| Err(Rejection { channel, value });
        match channel {
            Channel::Capacity => {
                if raw > limits.max_capacity_mah {
                    return reject(Reading::Unsigned(raw));
                }
                self.values.capacity_mah = raw;
            }
            Channel::Charge => {
                if raw > limits.max_charge_mah {
                    return reject(Reading::Unsigned(raw));
                }
                self.values.charge_mah = raw;
            }
            Channel::ChargingState => {
                if raw > u16::from(limits.max_charging_state) {
                    return reject(Reading::Unsigned(raw));
                }
                self.values.charging_state = raw as u8;
            }
            Channel::Voltage => {
                let volts = f32::from(raw) / 1000.0;
                if volts > limits.max_voltage_v {
                    return reject(Reading::Volts(volts));
                }
                self.values.voltage_v = volts;
            }
            Channel::Current => {
                let ma = raw as i16;
                if ma.unsigned_abs() > limits.max_abs_current_ma {
                    return reject(Reading::Signed(ma));
                }
                self.values.current_ma = ma;
            }
        }
        Ok(())
    }
}
