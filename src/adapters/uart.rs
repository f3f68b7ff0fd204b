//! UART link to the robot's Open Interface port.
//!
//! Implements [`SerialPort`] over the ESP-IDF UART driver, 8N1 at the
//! configured baud rate.  ESP-IDF only; host tests use
//! [`SimRobot`](super::sim_robot::SimRobot) instead.

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use log::warn;

use crate::app::ports::SerialPort;
use crate::error::DeviceError;

pub struct UartLink {
    driver: UartDriver<'static>,
}

impl UartLink {
    pub fn new<U: uart::Uart>(
        uart: impl Peripheral<P = U> + 'static,
        tx: impl Peripheral<P = impl OutputPin> + 'static,
        rx: impl Peripheral<P = impl InputPin> + 'static,
        baud: u32,
    ) -> anyhow::Result<Self> {
        let config = uart::config::Config::default().baudrate(Hertz(baud));
        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        Ok(Self { driver })
    }
}

impl SerialPort for UartLink {
    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), DeviceError> {
        while !bytes.is_empty() {
            match self.driver.write(bytes) {
                Ok(0) | Err(_) => return Err(DeviceError::WriteFailed),
                Ok(n) => bytes = &bytes[n..],
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, DeviceError> {
        let ticks = TickType::new_millis(u64::from(timeout_ms)).ticks();
        self.driver.read(buf, ticks).map_err(|e| {
            warn!("UART read: {}", e);
            DeviceError::ReadFailed
        })
    }

    fn discard_input(&mut self) {
        if let Err(e) = self.driver.clear_rx() {
            warn!("UART flush: {}", e);
        }
    }
}
