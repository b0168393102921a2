//! GPIO pin assignments for the motion-alert board.
//!
//! Single source of truth; drivers reference this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Motion sensors (digital, active HIGH, rising edge = motion)
// ---------------------------------------------------------------------------

/// Sensor facing into the protected room.
pub const INSIDE_PROX_GPIO: i32 = 3;
/// Sensor facing out of the doorway.
pub const OUTSIDE_PROX_GPIO: i32 = 2;
