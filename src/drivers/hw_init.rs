//! One-shot GPIO initialization for the two motion inputs.
//!
//! Configures the inside/outside sensor pins and, unless the inputs are
//! polled, installs the GPIO ISR service with one rising-edge handler per
//! sensor.  Called once from `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (esp_err={})", rc),
            Self::IsrInstallFailed(rc) => {
                write!(f, "GPIO ISR service install failed (esp_err={})", rc)
            }
            Self::IsrHandlerAddFailed(rc) => {
                write!(f, "GPIO ISR handler add failed (esp_err={})", rc)
            }
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── GPIO Inputs ───────────────────────────────────────────────

/// Configure both motion pins as plain inputs.  With `poll_inputs` the
/// pin interrupt stays disabled; otherwise it is armed for rising edges.
#[cfg(target_os = "espidf")]
pub fn init_motion_inputs(poll_inputs: bool) -> Result<(), HwInitError> {
    let intr_type = if poll_inputs {
        gpio_int_type_t_GPIO_INTR_DISABLE
    } else {
        gpio_int_type_t_GPIO_INTR_POSEDGE
    };

    for pin in [pins::INSIDE_PROX_GPIO, pins::OUTSIDE_PROX_GPIO] {
        // No pulls: the sensor modules drive the line push-pull.
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type,
        };
        // SAFETY: called once from main() before the control loop.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!(
        "hw_init: motion inputs configured (inside=GPIO{}, outside=GPIO{}, {})",
        pins::INSIDE_PROX_GPIO,
        pins::OUTSIDE_PROX_GPIO,
        if poll_inputs { "polled" } else { "rising-edge ISR" }
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_motion_inputs(_poll_inputs: bool) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): motion input config skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Simulation: lines idle low (no motion).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    false
}

/// A configured input pin addressed by GPIO number, for [`MotionLine`].
///
/// [`MotionLine`]: crate::sensors::motion::MotionLine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInputPin(pub i32);

impl ErrorType for RawInputPin {
    type Error = Infallible;
}

impl InputPin for RawInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.0))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.0))
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::error::warn_on_esp_err;
#[cfg(target_os = "espidf")]
use crate::events::ALARM_REQUESTS;
#[cfg(target_os = "espidf")]
use crate::sensors::motion::{on_motion, Side};

// ISR bodies: one atomic load and at most one atomic store.  No logging.

#[cfg(target_os = "espidf")]
unsafe extern "C" fn inside_motion_isr(_arg: *mut core::ffi::c_void) {
    on_motion(Side::Inside, &ALARM_REQUESTS);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn outside_motion_isr(_arg: *mut core::ffi::c_void) {
    on_motion(Side::Outside, &ALARM_REQUESTS);
}

/// Install the per-pin GPIO ISR service and register both motion handlers.
/// Call after [`init_motion_inputs`] and before the control loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handlers are static functions
    // that only touch the lock-free request slot.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let handlers: [(i32, unsafe extern "C" fn(*mut core::ffi::c_void)); 2] = [
            (pins::INSIDE_PROX_GPIO, inside_motion_isr),
            (pins::OUTSIDE_PROX_GPIO, outside_motion_isr),
        ];
        for (pin, handler) in handlers {
            let ret = gpio_isr_handler_add(pin, Some(handler), core::ptr::null_mut());
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrHandlerAddFailed(ret));
            }
            warn_on_esp_err("gpio_intr_enable", gpio_intr_enable(pin));
        }
    }
    info!("hw_init: ISR service installed (inside, outside)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
