//! ESP32 time adapter.
//!
//! Implements [`TimePort`]: a monotonic millisecond clock plus the blocking
//! [`DelayNs`] used for settling windows, tune playback and reconnect
//! cadence.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (microsecond,
//!   monotonic) and FreeRTOS task delays, so other tasks (WiFi, MQTT) keep
//!   running while the loop waits.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` and
//!   `thread::sleep` for host-side simulation.

use embedded_hal::delay::DelayNs;

use crate::app::ports::TimePort;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since start (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl TimePort for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }
}

#[cfg(target_os = "espidf")]
impl DelayNs for Esp32TimeAdapter {
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_svc::hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }
}

#[cfg(not(target_os = "espidf"))]
impl DelayNs for Esp32TimeAdapter {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
