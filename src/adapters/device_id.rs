//! Device identity derived from the ESP32 factory MAC address.
//!
//! The hostname is `<prefix>-xxyyzz`, the last 3 bytes of the 6-byte MAC in
//! lowercase hex (e.g. `roomba-efcafe`).  It is stable across reboots and is
//! what the bridge announces on the presence topic.

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `<prefix>-xxyyzz`.  Prefixes longer than 24 characters are truncated
/// to fit the hostname buffer.
pub fn hostname(prefix: &str, mac: &MacAddress) -> heapless::String<32> {
    use core::fmt::Write;
    let mut name = heapless::String::<32>::new();
    let prefix = prefix.get(..prefix.len().min(24)).unwrap_or("roomba");
    let _ = write!(name, "{}-{:02x}{:02x}{:02x}", prefix, mac[3], mac[4], mac[5]);
    name
}
