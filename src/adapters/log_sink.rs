//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::ChargingState;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | {:.0}% | {}/{} mAh | {:.2} V | {} mA | state={}",
                    t.percentage, t.charge_mah, t.capacity_mah, t.voltage_v, t.current_ma,
                    t.charging_state().map_or("unknown", ChargingState::label),
                );
            }
            AppEvent::LinkRestored { link, down_ms } => {
                info!("LINK | {:?} restored after {} ms", link, down_ms);
            }
            AppEvent::RestartRequested(reason) => {
                error!("LINK | restart requested: {:?}", reason);
            }
            AppEvent::ReadingRejected(r) => {
                warn!("READ | rejected {}", r);
            }
            AppEvent::ReadFailed(f) => {
                warn!("READ | {} failed: {}", f.channel.label(), f.error);
            }
            AppEvent::CommandHandled(cmd) => {
                info!("CMD | {:?} done", cmd);
            }
            AppEvent::CommandFailed { command, error } => {
                warn!("CMD | {:?} aborted: {}", command, error);
            }
            AppEvent::Started => {
                info!("START | links up, robot awake");
            }
        }
    }
}
