//! Unified error type for the motion-alert firmware.
//!
//! Each subsystem keeps its own small error enum next to the code that
//! raises it; this module collects them into one `Error` so bring-up in
//! `main` can funnel everything through `?`.  All variants are `Copy`.

use core::fmt;

use crate::adapters::ble::LinkError;
use crate::config::ConfigError;
use crate::drivers::hw_init::HwInitError;

/// Every fallible bring-up step funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration override rejected.
    Config(ConfigError),
    /// BLE stack could not be brought up.
    Link(LinkError),
    /// GPIO or interrupt setup failed.
    Hw(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Hw(e) => write!(f, "hw: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Hw(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

/// `esp_err_t` success code.
pub const ESP_OK_CODE: i32 = 0;

/// Log a non-fatal ESP-IDF call failure.  Returns `true` on `ESP_OK`.
pub fn warn_on_esp_err(op: &str, ret: i32) -> bool {
    if ret == ESP_OK_CODE {
        return true;
    }
    log::warn!("{} returned esp_err={}", op, ret);
    false
}
