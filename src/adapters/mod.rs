//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements   | Connects to                  |
//! |--------------|--------------|------------------------------|
//! | `uart`       | SerialPort   | ESP32 UART → robot OI port   |
//! | `sim_robot`  | SerialPort   | Simulated robot (host only)  |
//! | `wifi`       | NetworkPort  | ESP-IDF WiFi STA             |
//! | `mqtt`       | BrokerPort   | ESP-IDF MQTT client          |
//! | `time`       | TimePort     | ESP32 system timer + FreeRTOS|
//! | `system`     | SystemPort   | esp_restart / esp_random     |
//! | `sntp`       | Housekeeping | ESP-IDF SNTP                 |
//! | `log_sink`   | EventSink    | Serial log output            |
//! | `device_id`  | (none)       | Factory MAC → hostname       |

pub mod device_id;
pub mod log_sink;
pub mod mqtt;
#[cfg(not(target_os = "espidf"))]
pub mod sim_robot;
pub mod sntp;
pub mod system;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
pub mod wifi;
