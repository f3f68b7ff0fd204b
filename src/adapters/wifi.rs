//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`].  Credential validation lives in
//! [`Credentials`](crate::config::Credentials); this adapter only
//! associates and reports liveness.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: a scriptable simulation for host-side runs.
//!
//! ## Reconnection policy
//!
//! The adapter never retries on its own.  The
//! [`LinkSupervisor`](crate::supervisor::LinkSupervisor) calls
//! [`NetworkPort::reconnect`] at its retry cadence and decides when to give
//! up.

use log::info;
#[cfg(target_os = "espidf")]
use log::debug;

use crate::app::ports::NetworkPort;
use crate::config::Credentials;
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: BlockingWifi<EspWifi<'static>>,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: BlockingWifi<EspWifi<'static>>) -> Self {
        Self { wifi }
    }

    /// Configure the station, start the driver and initiate association.
    /// Does not wait for the link; the supervisor does that.
    pub fn begin(&mut self, credentials: &Credentials) -> Result<(), CommsError> {
        let auth_method = if credentials.wifi_password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: credentials
                .wifi_ssid
                .as_str()
                .try_into()
                .map_err(|_| CommsError::InvalidSsid)?,
            password: credentials
                .wifi_password
                .as_str()
                .try_into()
                .map_err(|_| CommsError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&config)
            .map_err(|_| CommsError::WifiConnectFailed)?;
        self.wifi.start().map_err(|_| CommsError::WifiConnectFailed)?;
        info!("WiFi: started, connecting to '{}'", credentials.wifi_ssid);
        self.reconnect()
    }
}

#[cfg(target_os = "espidf")]
impl NetworkPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    /// Called every retry tick.  Associated but still waiting for an
    /// address is left alone; the driver rejects `connect` mid-association.
    fn reconnect(&mut self) -> Result<(), CommsError> {
        if self.wifi.is_connected().unwrap_or(false) {
            return Ok(());
        }
        self.wifi.wifi_mut().connect().map_err(|e| {
            debug!("WiFi: connect request refused: {}", e);
            CommsError::WifiConnectFailed
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Host-side station.  Stays in whatever state the test puts it in;
/// `reconnect` only counts attempts unless `reconnect_succeeds` is set.
#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    connected: bool,
    reconnect_succeeds: bool,
    attempts: u32,
    ssid: heapless::String<32>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            connected: false,
            reconnect_succeeds: true,
            attempts: 0,
            ssid: heapless::String::new(),
        }
    }

    pub fn begin(&mut self, credentials: &Credentials) -> Result<(), CommsError> {
        self.ssid = credentials.wifi_ssid.clone();
        info!("WiFi(sim): connecting to '{}'", self.ssid);
        self.reconnect()
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn set_reconnect_succeeds(&mut self, succeeds: bool) {
        self.reconnect_succeeds = succeeds;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(not(target_os = "espidf"))]
impl NetworkPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reconnect(&mut self) -> Result<(), CommsError> {
        self.attempts += 1;
        if self.reconnect_succeeds {
            self.connected = true;
            Ok(())
        } else {
            Err(CommsError::WifiConnectFailed)
        }
    }
}
