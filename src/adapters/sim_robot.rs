//! Simulated Open Interface robot.
//!
//! Implements [`SerialPort`] by decoding the bytes the driver writes as OI
//! frames and reacting the way the robot does: mode changes, song slots,
//! playback and sensor responses.  Used for host-side simulation and
//! integration tests.
//!
//! ## Modes
//!
//! The robot starts `Off`.  Only `Start` is honoured while off; everything
//! else is dropped, exactly like a robot whose OI has not been woken.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use crate::app::ports::SerialPort;
use crate::drivers::roomba::{SensorPacket, opcode};
use crate::drivers::songs::{MAX_SLOT, ToneSequence};
use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OiMode {
    Off,
    Passive,
    Safe,
    Full,
}

/// Something the robot did in response to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotAction {
    Start,
    Safe,
    Full,
    PowerDown,
    Clean,
    SeekDock,
    LoadSong(u8),
    PlaySong(u8),
    Query(SensorPacket),
}

pub struct SimRobot {
    mode: OiMode,
    pending: Vec<u8>,
    rx: VecDeque<u8>,
    actions: Vec<RobotAction>,
    slots: [Option<ToneSequence>; MAX_SLOT as usize + 1],
    played: Vec<(u8, ToneSequence)>,
    sensors: HashMap<SensorPacket, u16>,
    silent_queries: u32,
    fail_writes: bool,
}

impl Default for SimRobot {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRobot {
    pub fn new() -> Self {
        Self {
            mode: OiMode::Off,
            pending: Vec::new(),
            rx: VecDeque::new(),
            actions: Vec::new(),
            slots: Default::default(),
            played: Vec::new(),
            sensors: HashMap::new(),
            silent_queries: 0,
            fail_writes: false,
        }
    }

    // ── Scripting ─────────────────────────────────────────────

    /// Raw value returned for `packet` from now on.
    pub fn set_sensor(&mut self, packet: SensorPacket, raw: u16) {
        self.sensors.insert(packet, raw);
    }

    /// Leave the next `count` sensor queries unanswered.
    pub fn drop_responses(&mut self, count: u32) {
        self.silent_queries = count;
    }

    /// Make every write fail until cleared.
    pub fn set_write_failure(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn mode(&self) -> OiMode {
        self.mode
    }

    pub fn actions(&self) -> &[RobotAction] {
        &self.actions
    }

    pub fn slot(&self, slot: u8) -> Option<&ToneSequence> {
        self.slots.get(usize::from(slot)).and_then(Option::as_ref)
    }

    /// Every playback so far, as (slot, sequence played).
    pub fn played(&self) -> &[(u8, ToneSequence)] {
        &self.played
    }

    // ── Frame decoding ────────────────────────────────────────

    /// Bytes a frame starting with `op` needs, or `None` if more must
    /// arrive before the length is known.
    fn frame_len(buf: &[u8]) -> Option<usize> {
        match buf[0] {
            opcode::PLAY | opcode::SENSORS => Some(2),
            opcode::SONG => buf.get(2).map(|&n| 3 + 2 * usize::from(n)),
            _ => Some(1),
        }
    }

    fn process(&mut self) {
        while !self.pending.is_empty() {
            let Some(len) = Self::frame_len(&self.pending) else {
                return;
            };
            if self.pending.len() < len {
                return;
            }
            let frame: Vec<u8> = self.pending.drain(..len).collect();
            self.execute(&frame);
        }
    }

    fn execute(&mut self, frame: &[u8]) {
        let op = frame[0];
        if self.mode == OiMode::Off && op != opcode::START {
            debug!("sim robot: opcode {} ignored while off", op);
            return;
        }
        match op {
            opcode::START => {
                self.mode = OiMode::Passive;
                self.actions.push(RobotAction::Start);
            }
            opcode::SAFE => {
                self.mode = OiMode::Safe;
                self.actions.push(RobotAction::Safe);
            }
            opcode::FULL => {
                self.mode = OiMode::Full;
                self.actions.push(RobotAction::Full);
            }
            opcode::POWER => {
                self.mode = OiMode::Off;
                self.actions.push(RobotAction::PowerDown);
            }
            opcode::CLEAN => {
                self.mode = OiMode::Passive;
                self.actions.push(RobotAction::Clean);
            }
            opcode::SEEK_DOCK => {
                self.mode = OiMode::Passive;
                self.actions.push(RobotAction::SeekDock);
            }
            opcode::SONG => self.load_song(frame),
            opcode::PLAY => self.play_song(frame[1]),
            opcode::SENSORS => self.answer_query(frame[1]),
            other => warn!("sim robot: unknown opcode {}", other),
        }
    }

    fn load_song(&mut self, frame: &[u8]) {
        let slot = frame[1];
        let pairs: Vec<(u8, u8)> = frame[3..].chunks_exact(2).map(|p| (p[0], p[1])).collect();
        match (self.slots.get_mut(usize::from(slot)), ToneSequence::from_pairs(&pairs)) {
            (Some(entry), Ok(sequence)) => {
                *entry = Some(sequence);
                self.actions.push(RobotAction::LoadSong(slot));
            }
            _ => warn!("sim robot: bad song frame for slot {}", slot),
        }
    }

    fn play_song(&mut self, slot: u8) {
        let Some(sequence) = self.slot(slot).cloned() else {
            debug!("sim robot: slot {} empty", slot);
            return;
        };
        self.played.push((slot, sequence));
        self.actions.push(RobotAction::PlaySong(slot));
    }

    fn answer_query(&mut self, id: u8) {
        let Some(packet) = SensorPacket::from_id(id) else {
            warn!("sim robot: unsupported packet {}", id);
            return;
        };
        self.actions.push(RobotAction::Query(packet));
        if self.silent_queries > 0 {
            self.silent_queries -= 1;
            return;
        }
        let raw = self.sensors.get(&packet).copied().unwrap_or(0);
        match packet.width() {
            1 => self.rx.push_back(raw as u8),
            _ => self.rx.extend(raw.to_be_bytes()),
        }
    }
}

impl SerialPort for SimRobot {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), DeviceError> {
        if self.fail_writes {
            return Err(DeviceError::WriteFailed);
        }
        self.pending.extend_from_slice(bytes);
        self.process();
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, DeviceError> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn discard_input(&mut self) {
        self.rx.clear();
    }
}
