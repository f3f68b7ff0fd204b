//! Fuzz target: `BatteryMonitor::sample_all`
//!
//! Serves arbitrary bytes as the robot's answers to sensor queries and
//! asserts that committed values never leave their plausibility bounds and
//! that the percentage always matches the committed charge/capacity pair.
//!
//! cargo fuzz run fuzz_sensor_stream

#![no_main]

use embedded_hal::delay::DelayNs;
use libfuzzer_sys::fuzz_target;
use roombridge::app::ports::SerialPort;
use roombridge::config::{PlausibilityLimits, RobotConfig};
use roombridge::drivers::roomba::RoombaDriver;
use roombridge::error::DeviceError;
use roombridge::sensors::{BatteryMonitor, percentage};

/// Replays the fuzz input as receive-side bytes, a few at a time.
struct Replay<'a> {
    data: &'a [u8],
}

impl SerialPort for Replay<'_> {
    fn write_all(&mut self, _bytes: &[u8]) -> Result<(), DeviceError> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, DeviceError> {
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

fuzz_target!(|data: &[u8]| {
    let limits = PlausibilityLimits::default();
    let mut driver = RoombaDriver::new(Replay { data }, &RobotConfig::default());
    let mut monitor = BatteryMonitor::new(limits);

    // Enough cycles to drain any input the fuzzer is likely to produce.
    for _ in 0..64 {
        monitor.sample_all(&mut driver, &mut NoDelay);
        let s = monitor.snapshot();
        assert!(s.capacity_mah <= limits.max_capacity_mah);
        assert!(s.charge_mah <= limits.max_charge_mah);
        assert!(s.charging_state <= limits.max_charging_state);
        assert!(s.voltage_v <= limits.max_voltage_v);
        assert!(s.current_ma.unsigned_abs() <= limits.max_abs_current_ma);
        assert_eq!(s.percentage, percentage(s.charge_mah, s.capacity_mah));
        if driver.port().data.is_empty() {
            break;
        }
    }
});
