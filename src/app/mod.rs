//! Application core: pure domain logic, zero I/O.
//!
//! Orchestrates the alarm state machine once per control-loop iteration.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
