//! Motion-alert firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;

// ESP-IDF-facing modules; host builds get the simulation halves.
pub mod adapters;
pub mod drivers;
pub mod sensors;
