//! RoomBridge Firmware Main Entry Point
//!
//! Wires the ESP-IDF adapters into the [`BridgeService`] and runs its loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartLink       WifiAdapter     MqttAdapter    Esp32Time       │
//! │  (SerialPort)   (NetworkPort)   (BrokerPort)   (TimePort)      │
//! │  EspSystem      TimeSync        LogEventSink                   │
//! │  (SystemPort)   (Housekeeping)  (EventSink)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              BridgeService (domain)                    │    │
//! │  │  Supervisors · Dispatcher · BatteryMonitor · Telemetry │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use roombridge::adapters::device_id;
use roombridge::adapters::log_sink::LogEventSink;
use roombridge::adapters::mqtt::MqttAdapter;
use roombridge::adapters::sntp::TimeSync;
use roombridge::adapters::system::EspSystem;
use roombridge::adapters::time::Esp32TimeAdapter;
use roombridge::adapters::uart::UartLink;
use roombridge::adapters::wifi::WifiAdapter;
use roombridge::app::service::BridgeService;
use roombridge::config::{BridgeConfig, Credentials};
use roombridge::pins;

/// Yield between loop ticks so the idle task can feed the watchdog.
const LOOP_YIELD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  RoomBridge v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = BridgeConfig::load()?;
    let credentials = Credentials::from_build_env()?;
    let hostname = device_id::hostname(&config.hostname_prefix, &device_id::read_mac());
    info!("Device: {} | broker {}", hostname, config.broker_url());

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    info!(
        "OI UART1: TX GPIO{} | RX GPIO{} | {} baud",
        pins::ROBOT_UART_TX_GPIO,
        pins::ROBOT_UART_RX_GPIO,
        config.robot.baud
    );
    let serial = UartLink::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        config.robot.baud,
    )?;

    // ── 4. Network ────────────────────────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?);
    if let Err(e) = wifi.begin(&credentials) {
        warn!("WiFi: initial connect failed ({}), supervisor will retry", e);
    }

    let broker = MqttAdapter::new(
        config.broker_url(),
        &credentials,
        &config.topics.status,
        config.mqtt.connect_timeout_ms,
    );

    // ── 5. Service ────────────────────────────────────────────
    let mut time_sync = TimeSync::new()?;
    let mut sink = LogEventSink::new();
    let mut bridge = BridgeService::new(
        config,
        serial,
        wifi,
        broker,
        Esp32TimeAdapter::new(),
        EspSystem::new(),
    );

    bridge.start(&hostname, &mut sink);

    // ── 6. Main loop ──────────────────────────────────────────
    loop {
        bridge.tick(&mut time_sync, &mut sink);
        FreeRtos::delay_ms(LOOP_YIELD_MS);
    }
}
