//! GPIO / peripheral assignments for the RoomBridge board.
//!
//! Single source of truth for the wiring between the ESP32 and the robot's
//! mini-DIN Open Interface connector.  `main` picks the matching typed pins
//! from `Peripherals`; these constants document the wiring and feed the
//! start-up log.

// ---------------------------------------------------------------------------
// Open Interface UART (UART1)
// ---------------------------------------------------------------------------

/// ESP32 TX -> robot RXD (mini-DIN pin 3), through a level shifter.
pub const ROBOT_UART_TX_GPIO: i32 = 17;
/// Robot TXD (mini-DIN pin 4) -> ESP32 RX.
pub const ROBOT_UART_RX_GPIO: i32 = 18;
/// Open Interface default baud rate on 500/600 series robots.
pub const ROBOT_UART_BAUD: u32 = 115_200;
