//! Network time.
//!
//! Starts SNTP and logs the wall clock once the first sync completes.
//! Control logic never reads wall-clock time; this only makes the console
//! log easier to correlate.

use log::info;

use crate::app::ports::Housekeeping;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sntp::{EspSntp, SyncStatus};

pub struct TimeSync {
    #[cfg(target_os = "espidf")]
    sntp: EspSntp<'static>,
    synced: bool,
}

impl TimeSync {
    #[cfg(target_os = "espidf")]
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            sntp: EspSntp::new_default()?,
            synced: false,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { synced: false })
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    #[cfg(target_os = "espidf")]
    fn check(&self) -> bool {
        self.sntp.get_sync_status() == SyncStatus::Completed
    }

    #[cfg(not(target_os = "espidf"))]
    fn check(&self) -> bool {
        true
    }
}

impl Housekeeping for TimeSync {
    fn poll(&mut self) {
        if self.synced || !self.check() {
            return;
        }
        self.synced = true;
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        info!("SNTP: clock synced, unix time {}", secs);
    }
}
