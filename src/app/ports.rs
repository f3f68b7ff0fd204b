//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! Driven adapters (UART, WiFi, MQTT, clock, chip services) implement these
//! traits.  The [`BridgeService`](super::service::BridgeService) owns them
//! through generics, so the domain core never touches ESP-IDF directly and
//! tests can substitute a virtual clock and scripted links.

use embedded_hal::delay::DelayNs;

use crate::error::{CommsError, DeviceError};

// ───────────────────────────────────────────────────────────────
// Serial port (robot Open Interface)
// ───────────────────────────────────────────────────────────────

/// Byte-oriented link to the robot.  There is no flow control or
/// acknowledgement beyond the raw bytes.
pub trait SerialPort {
    /// Write every byte or fail.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), DeviceError>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms` for them.
    /// Returns how many bytes actually arrived.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, DeviceError>;

    /// Drop any bytes already buffered on the receive side.
    fn discard_input(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Time
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus blocking delay.
///
/// Every wait in the firmware (settling windows, tune playback, reconnect
/// cadence) goes through the [`DelayNs`] half, so a test clock that advances
/// on delay makes the whole loop deterministic.
pub trait TimePort: DelayNs {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Links
// ───────────────────────────────────────────────────────────────

/// A connection the [`LinkSupervisor`](crate::supervisor::LinkSupervisor)
/// can probe and try to re-establish.
pub trait LinkPort {
    /// Cheap liveness check.
    fn probe(&mut self) -> bool;

    /// One reconnection attempt.  Failure is not an error to the caller;
    /// the supervisor keeps probing.
    fn reconnect(&mut self);
}

/// The WiFi station link.
pub trait NetworkPort {
    fn is_connected(&self) -> bool;

    /// Re-issue association with the configured access point.
    fn reconnect(&mut self) -> Result<(), CommsError>;
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<64>,
    pub payload: heapless::Vec<u8, 64>,
}

impl InboundMessage {
    /// Build a message, or `None` if topic or payload exceed the fixed capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self { topic: t, payload: p })
    }
}

/// The MQTT session.
pub trait BrokerPort {
    fn is_connected(&self) -> bool;

    /// Open a fresh session under `client_id`.  The adapter registers the
    /// last-will message it was constructed with.
    fn connect(&mut self, client_id: &str) -> Result<(), CommsError>;

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError>;

    /// QoS 0, not retained.
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;

    /// Next pending inbound message, if any.  Never blocks.
    fn poll(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Chip services
// ───────────────────────────────────────────────────────────────

/// Why the bridge asked for a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    NetworkTimeout,
    BrokerTimeout,
    Commanded,
}

pub trait SystemPort {
    /// Reset the chip.  On hardware this does not return.
    fn restart(&mut self, reason: RestartReason);

    /// Hardware random number.
    fn random_u32(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Housekeeping
// ───────────────────────────────────────────────────────────────

/// Background services polled once per tick (time sync and similar).
/// They never influence control decisions.
pub trait Housekeeping {
    fn poll(&mut self);
}

impl Housekeeping for () {
    fn poll(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
