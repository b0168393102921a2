//! Task Watchdog Timer (TWDT) driver.
//!
//! The control loop never blocks, so the idle tasks never run.  The TWDT is
//! reconfigured to stop checking them and to watch the main task instead;
//! the loop calls [`Watchdog::feed`] once per pass.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Reset the chip if the control loop stalls this long.
pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

/// No idle task is checked.
pub const IDLE_CORE_MASK: u32 = 0;

pub struct Watchdog {
    subscribed: bool,
    feeds: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        // SAFETY: called once from main() before the control loop.
        unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: WATCHDOG_TIMEOUT_MS,
                idle_core_mask: IDLE_CORE_MASK,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK as i32 {
                warn!("Watchdog: reconfigure returned {} (may already be configured)", ret);
            }

            let ret = esp_task_wdt_add(core::ptr::null_mut());
            let subscribed = ret == ESP_OK as i32;
            if subscribed {
                info!(
                    "Watchdog: main task subscribed ({} ms, idle tasks unchecked)",
                    WATCHDOG_TIMEOUT_MS
                );
            } else {
                warn!("Watchdog: failed to subscribe ({})", ret);
            }
            Self {
                subscribed,
                feeds: 0,
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        log::info!("Watchdog(sim): no-op");
        Self {
            subscribed: false,
            feeds: 0,
        }
    }

    /// Feed the watchdog.  Call once per control-loop pass.
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the calling task was subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Feeds since construction (wrapping).
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}
