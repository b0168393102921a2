//! Device identity derived from the ESP32 Bluetooth MAC address.
//!
//! The advertised local name is `<prefix>-xxyyzz`, built from the last
//! three bytes of the BT MAC (lowercase hex), so several controllers in
//! range stay distinguishable.  The MAC is factory-burned, so the name is
//! stable across reboots.

use core::fmt::Write;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// `aa:bb:cc:dd:ee:ff`
pub type MacString = heapless::String<17>;

/// Advertised name buffer: 16-byte prefix, dash, six hex digits.
pub type AdvertisedName = heapless::String<24>;

/// Read the Bluetooth MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_ble_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_read_mac(
            mac.as_mut_ptr(),
            esp_idf_svc::sys::esp_mac_type_t_ESP_MAC_BT,
        );
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_ble_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Colon-separated lowercase hex, for the boot log.
pub fn format_mac(mac: &MacAddress) -> MacString {
    let mut s = MacString::new();
    let _ = write!(
        s,
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    s
}

/// `<prefix>-xxyyzz` from the last 3 MAC bytes.
pub fn advertised_name(prefix: &str, mac: &MacAddress) -> AdvertisedName {
    let mut name = AdvertisedName::new();
    let _ = write!(name, "{prefix}-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
