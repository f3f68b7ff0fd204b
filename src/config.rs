//! System configuration parameters
//!
//! All tunable parameters for the RoomBridge firmware.  Defaults match the
//! reference deployment; a JSON document baked in at build time can
//! override any subset of them (see [`BridgeConfig::from_json`]).

use serde::{Deserialize, Serialize};

use crate::error::CommsError;
use crate::pins;

/// Core bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // --- Connectivity watchdog ---
    /// Maximum WiFi downtime before the device restarts (milliseconds)
    pub network_timeout_ms: u64,
    /// Maximum broker-session downtime before the device restarts (milliseconds)
    pub broker_timeout_ms: u64,
    /// Pause between reconnection attempts while a link is down (milliseconds)
    pub reconnect_retry_ms: u32,

    // --- Telemetry ---
    /// Sensor sampling + publish cadence (milliseconds)
    pub telemetry_interval_ms: u64,

    // --- Robot serial link ---
    pub robot: RobotConfig,

    // --- Reading validation ---
    pub limits: PlausibilityLimits,

    // --- Broker ---
    pub mqtt: MqttConfig,
    pub topics: Topics,

    /// Hostname prefix; the last three MAC bytes are appended.
    pub hostname_prefix: String,
}

/// Open Interface UART parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub baud: u32,
    /// Settling delay after every command or query (milliseconds)
    pub settle_ms: u32,
    /// Window in which a sensor response must fully arrive (milliseconds)
    pub read_timeout_ms: u32,
}

/// Upper bounds beyond which a fresh reading is treated as a garbled frame.
///
/// Each bound sits well above anything the battery class can produce, so a
/// rejection means the serial link returned garbage, not a real extreme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityLimits {
    /// The largest pack is about 4000 mAh.
    pub max_capacity_mah: u16,
    pub max_charge_mah: u16,
    /// Highest charging-state code defined by the Open Interface.
    pub max_charging_state: u8,
    /// Fully charged packs sit around 17 V.
    pub max_voltage_v: f32,
    /// Normal draw is about 2 A.
    pub max_abs_current_ma: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// A random 16-bit hex suffix is appended on every reconnect.
    pub client_id_prefix: String,
    /// How long a connect attempt waits for the session to come up (milliseconds).
    /// Each broker reconnect attempt blocks this long before the supervisor's
    /// `reconnect_retry_ms` pause, so it sets the real retry period.
    pub connect_timeout_ms: u32,
}

/// Topic layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    pub commands: String,
    pub status: String,
    pub debug: String,
    pub presence: String,
    pub battery_percentage: String,
    pub battery_capacity: String,
    pub battery_charge: String,
    pub battery_voltage: String,
    pub battery_current: String,
    pub charging_state: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // Watchdog
            network_timeout_ms: 15_000,
            broker_timeout_ms: 120_000,
            reconnect_retry_ms: 100,

            // Telemetry
            telemetry_interval_ms: 10_000,

            robot: RobotConfig::default(),
            limits: PlausibilityLimits::default(),
            mqtt: MqttConfig::default(),
            topics: Topics::default(),

            hostname_prefix: "roomba".into(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            baud: pins::ROBOT_UART_BAUD,
            settle_ms: 100,
            read_timeout_ms: 200,
        }
    }
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        Self {
            max_capacity_mah: 5000,
            max_charge_mah: 5000,
            max_charging_state: 5,
            max_voltage_v: 25.0,
            max_abs_current_ma: 6000,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.10".into(),
            port: 1883,
            client_id_prefix: "esp32Roomba-".into(),
            connect_timeout_ms: 5_000,
        }
    }
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            commands: "roomba/commands".into(),
            status: "roomba/status".into(),
            debug: "roomba/debug".into(),
            presence: "online".into(),
            battery_percentage: "roomba/battery/percentage".into(),
            battery_capacity: "roomba/battery/capacity".into(),
            battery_charge: "roomba/battery/charge".into(),
            battery_voltage: "roomba/battery/voltage".into(),
            battery_current: "roomba/battery/current".into(),
            charging_state: "roomba/charge".into(),
        }
    }
}

impl BridgeConfig {
    /// Build a config from a (possibly partial) JSON document.  Missing
    /// fields keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overlaid with `ROOMBRIDGE_CONFIG_JSON` if it was set at
    /// build time.
    pub fn load() -> anyhow::Result<Self> {
        match option_env!("ROOMBRIDGE_CONFIG_JSON") {
            Some(json) => Self::from_json(json),
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would make the watchdog or sampler misbehave.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        use crate::error::Error::Config;
        if self.reconnect_retry_ms == 0 {
            return Err(Config("reconnect_retry_ms must be non-zero"));
        }
        if self.network_timeout_ms <= u64::from(self.reconnect_retry_ms)
            || self.broker_timeout_ms <= u64::from(self.reconnect_retry_ms)
        {
            return Err(Config("link timeouts must exceed the retry cadence"));
        }
        if self.telemetry_interval_ms == 0 {
            return Err(Config("telemetry_interval_ms must be non-zero"));
        }
        if self.robot.baud == 0 {
            return Err(Config("robot baud must be non-zero"));
        }
        if self.limits.max_voltage_v <= 0.0 {
            return Err(Config("max_voltage_v must be positive"));
        }
        Ok(())
    }

    /// `mqtt://host:port`, as expected by the ESP-IDF client.
    pub fn broker_url(&self) -> String {
        format!("mqtt://{}:{}", self.mqtt.host, self.mqtt.port)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Network secrets, injected through build-time environment variables.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    pub mqtt_user: Option<String>,
    pub mqtt_password: Option<String>,
}

impl Credentials {
    /// Validate and assemble credentials.
    pub fn new(
        ssid: &str,
        password: &str,
        mqtt_user: Option<&str>,
        mqtt_password: Option<&str>,
    ) -> Result<Self, CommsError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut creds = Self::default();
        creds.wifi_ssid.push_str(ssid).map_err(|_| CommsError::InvalidSsid)?;
        creds
            .wifi_password
            .push_str(password)
            .map_err(|_| CommsError::InvalidPassword)?;
        creds.mqtt_user = mqtt_user.filter(|u| !u.is_empty()).map(str::to_owned);
        creds.mqtt_password = mqtt_password.filter(|p| !p.is_empty()).map(str::to_owned);
        Ok(creds)
    }

    /// Read the `ROOMBRIDGE_*` variables captured at build time.
    pub fn from_build_env() -> Result<Self, CommsError> {
        let ssid = option_env!("ROOMBRIDGE_WIFI_SSID").ok_or(CommsError::NoCredentials)?;
        Self::new(
            ssid,
            option_env!("ROOMBRIDGE_WIFI_PASSWORD").unwrap_or(""),
            option_env!("ROOMBRIDGE_MQTT_USER"),
            option_env!("ROOMBRIDGE_MQTT_PASSWORD"),
        )
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CommsError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CommsError::InvalidPassword);
    }
    Ok(())
}
