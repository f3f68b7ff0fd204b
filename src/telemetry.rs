//! Battery telemetry formatting.
//!
//! Turns a [`BatterySnapshot`] into the (topic, payload) pairs published on
//! every telemetry interval.  Payloads are plain decimal text.

use crate::config::Topics;
use crate::sensors::BatterySnapshot;

/// One outbound telemetry message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryMessage<'a> {
    pub topic: &'a str,
    pub payload: String,
}

/// Messages for one publish, in publish order.
pub fn messages<'a>(topics: &'a Topics, snapshot: &BatterySnapshot) -> [TelemetryMessage<'a>; 6] {
    let msg = |topic: &'a String, payload: String| TelemetryMessage {
        topic: topic.as_str(),
        payload,
    };
    [
        // Truncated, not rounded.
        msg(
            &topics.battery_percentage,
            format!("{}", snapshot.percentage as u32),
        ),
        msg(&topics.battery_capacity, snapshot.capacity_mah.to_string()),
        msg(&topics.battery_charge, snapshot.charge_mah.to_string()),
        msg(&topics.battery_voltage, format!("{:.2}", snapshot.voltage_v)),
        msg(&topics.battery_current, snapshot.current_ma.to_string()),
        msg(&topics.charging_state, snapshot.charging_state.to_string()),
    ]
}
