//! Sensor inputs.
//!
//! The doorway carries two motion sensors; [`motion`] turns their edges
//! into transition requests for the alarm state machine.

pub mod motion;
