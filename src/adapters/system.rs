//! Chip services: reset and hardware randomness.
//!
//! Implements [`SystemPort`].  On ESP-IDF `restart` never returns; the
//! simulation only counts requests so tests can assert on them.

use log::error;

use crate::app::ports::{RestartReason, SystemPort};

pub struct EspSystem {
    #[cfg(not(target_os = "espidf"))]
    restarts: Vec<RestartReason>,
    #[cfg(not(target_os = "espidf"))]
    seed: u32,
}

impl Default for EspSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl EspSystem {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            restarts: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            seed: 0x2545_f491,
        }
    }

    /// Restart requests seen so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn restarts(&self) -> &[RestartReason] {
        &self.restarts
    }
}

#[cfg(target_os = "espidf")]
impl SystemPort for EspSystem {
    fn restart(&mut self, reason: RestartReason) {
        error!("restarting: {:?}", reason);
        esp_idf_svc::hal::reset::restart();
    }

    fn random_u32(&mut self) -> u32 {
        unsafe { esp_idf_svc::sys::esp_random() }
    }
}

#[cfg(not(target_os = "espidf"))]
impl SystemPort for EspSystem {
    fn restart(&mut self, reason: RestartReason) {
        error!("restart requested (sim): {:?}", reason);
        self.restarts.push(reason);
    }

    /// xorshift32; deterministic so client ids are reproducible in tests.
    fn random_u32(&mut self) -> u32 {
        let mut x = self.seed;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.seed = x;
        x
    }
}
