//! iRobot Open Interface driver.
//!
//! Encodes mode changes, song programming/playback, cleaning commands and
//! sensor queries as raw OI byte sequences on a [`SerialPort`].
//!
//! ## Settling contract
//!
//! The OI has no acknowledgement.  After every command or query the driver
//! blocks for `settle_ms` so the robot is ready for the next byte.  The wait
//! happens whether or not the command succeeded; callers never issue two
//! commands back to back without it.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::SerialPort;
use crate::config::RobotConfig;
use crate::drivers::songs::{MAX_SLOT, ToneSequence};
use crate::error::DeviceError;

/// Open Interface opcodes used by the bridge.
pub mod opcode {
    pub const START: u8 = 128;
    pub const SAFE: u8 = 131;
    pub const FULL: u8 = 132;
    pub const POWER: u8 = 133;
    pub const CLEAN: u8 = 135;
    pub const SONG: u8 = 140;
    pub const PLAY: u8 = 141;
    pub const SENSORS: u8 = 142;
    pub const SEEK_DOCK: u8 = 143;
}

/// Sensor packets the bridge queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorPacket {
    ChargingState = 21,
    Voltage = 22,
    Current = 23,
    Charge = 25,
    Capacity = 26,
}

impl SensorPacket {
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Response width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::ChargingState => 1,
            Self::Voltage | Self::Current | Self::Charge | Self::Capacity => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            21 => Some(Self::ChargingState),
            22 => Some(Self::Voltage),
            23 => Some(Self::Current),
            25 => Some(Self::Charge),
            26 => Some(Self::Capacity),
            _ => None,
        }
    }
}

/// Decode a big-endian response of one or two bytes.
pub fn decode_be(bytes: &[u8]) -> u16 {
    match bytes {
        [b] => u16::from(*b),
        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
        [] => 0,
    }
}

pub struct RoombaDriver<S: SerialPort> {
    port: S,
    settle_ms: u32,
    read_timeout_ms: u32,
}

impl<S: SerialPort> RoombaDriver<S> {
    pub fn new(port: S, config: &RobotConfig) -> Self {
        Self {
            port,
            settle_ms: config.settle_ms,
            read_timeout_ms: config.read_timeout_ms,
        }
    }

    pub fn port(&self) -> &S {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    // ── Modes ─────────────────────────────────────────────────

    /// Wake the OI into Passive mode.  Required before anything else.
    pub fn start(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        self.command(&[opcode::START], delay)
    }

    pub fn safe_mode(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        self.command(&[opcode::SAFE], delay)
    }

    /// Full mode; songs only play reliably from here.
    pub fn full_mode(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        self.command(&[opcode::FULL], delay)
    }

    // ── Actions ───────────────────────────────────────────────

    pub fn clean(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        self.command(&[opcode::CLEAN], delay)
    }

    pub fn dock(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        self.command(&[opcode::SEEK_DOCK], delay)
    }

    pub fn power_off(&mut self, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        self.command(&[opcode::POWER], delay)
    }

    // ── Songs ─────────────────────────────────────────────────

    /// Program `sequence` into `slot`, replacing whatever it held.
    pub fn load_song(
        &mut self,
        slot: u8,
        sequence: &ToneSequence,
        delay: &mut impl DelayNs,
    ) -> Result<(), DeviceError> {
        check_slot(slot)?;
        let mut frame: heapless::Vec<u8, 35> = heapless::Vec::new();
        // Capacity is 3 + 2 * MAX_NOTES, which ToneSequence guarantees.
        let _ = frame.extend_from_slice(&[opcode::SONG, slot, sequence.len() as u8]);
        for note in sequence.notes() {
            let _ = frame.extend_from_slice(&[note.pitch, note.duration]);
        }
        self.command(&frame, delay)
    }

    /// Start playback of `slot`.  Returns after the settling window; the
    /// caller waits out the tune itself.
    pub fn play_song(&mut self, slot: u8, delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        check_slot(slot)?;
        self.command(&[opcode::PLAY, slot], delay)
    }

    // ── Sensors ───────────────────────────────────────────────

    /// Query one sensor packet and return its raw big-endian value.
    pub fn query(
        &mut self,
        packet: SensorPacket,
        delay: &mut impl DelayNs,
    ) -> Result<u16, DeviceError> {
        self.port.discard_input();
        let result = self.read_packet(packet);
        delay.delay_ms(self.settle_ms);
        result
    }

    // ── Internal ──────────────────────────────────────────────

    fn read_packet(&mut self, packet: SensorPacket) -> Result<u16, DeviceError> {
        self.port.write_all(&[opcode::SENSORS, packet.id()])?;
        let mut buf = [0u8; 2];
        let width = packet.width();
        let received = self.port.read(&mut buf[..width], self.read_timeout_ms)?;
        if received < width {
            return Err(DeviceError::Timeout {
                expected: width,
                received,
            });
        }
        let value = decode_be(&buf[..width]);
        debug!("OI: packet {} -> {}", packet.id(), value);
        Ok(value)
    }

    fn command(&mut self, bytes: &[u8], delay: &mut impl DelayNs) -> Result<(), DeviceError> {
        let result = self.port.write_all(bytes);
        delay.delay_ms(self.settle_ms);
        result
    }
}

fn check_slot(slot: u8) -> Result<(), DeviceError> {
    if slot > MAX_SLOT {
        return Err(DeviceError::InvalidSongSlot(slot));
    }
    Ok(())
}
