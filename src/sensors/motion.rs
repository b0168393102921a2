//! Motion sensor event source.
//!
//! Two PIR-style proximity sensors sit on either side of a doorway.  Each
//! raises a rising edge when it sees motion.  The edge handler's only job is
//! to post a transition request into the [`RequestSlot`]; it never touches
//! timers, the status byte, or the radio.
//!
//! | Current state | Motion (either side)          |
//! |---------------|-------------------------------|
//! | Idle          | request `Pending(side)`       |
//! | Pending       | request `Alert`               |
//! | Alert         | ignored (latch owns the line) |
//!
//! Edges normally arrive from GPIO interrupts (see `drivers::hw_init`).
//! [`MotionLine`] is the polled alternative: it samples an
//! [`embedded_hal`] input pin and converts low→high changes into the same
//! handler call.

use embedded_hal::digital::InputPin;

use crate::events::{Request, RequestSlot};
use crate::fsm::AlarmState;

/// Which sensor saw the motion.  The discriminant is the wire value of the
/// status byte while the alarm is pending or alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    Inside = 0x01,
    Outside = 0x02,
}

impl Side {
    /// Status-byte flag for this side.
    pub const fn flag(self) -> u8 {
        self as u8
    }

    pub const fn from_flag(raw: u8) -> Option<Self> {
        match raw {
            0x01 => Some(Self::Inside),
            0x02 => Some(Self::Outside),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }
}

/// What a motion edge asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    RequestedPending,
    RequestedAlert,
    Ignored,
}

/// Rising-edge handler.  Safe to call from ISR context: one atomic load
/// and at most one atomic store, no logging, no blocking.
pub fn on_motion(side: Side, slot: &RequestSlot) -> MotionOutcome {
    match slot.current() {
        AlarmState::Idle => {
            slot.request(Request::Pending(side));
            MotionOutcome::RequestedPending
        }
        AlarmState::Pending => {
            slot.request(Request::Alert);
            MotionOutcome::RequestedAlert
        }
        AlarmState::Alert => MotionOutcome::Ignored,
    }
}

// ───────────────────────────────────────────────────────────────
// Polled edge source
// ───────────────────────────────────────────────────────────────

/// A motion input sampled from the main loop instead of an interrupt.
///
/// No debouncing is applied; a line that chatters produces one edge per
/// observed low→high change, exactly as the interrupt path would.
pub struct MotionLine<P> {
    side: Side,
    pin: P,
    last_high: bool,
}

impl<P: InputPin> MotionLine<P> {
    /// Wrap `pin`, seeding the edge detector with its current level so a
    /// line that is already high at boot does not count as an edge.
    pub fn new(side: Side, mut pin: P) -> Result<Self, P::Error> {
        let last_high = pin.is_high()?;
        Ok(Self {
            side,
            pin,
            last_high,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Sample the pin; `true` on a low→high transition since the last call.
    pub fn rising_edge(&mut self) -> Result<bool, P::Error> {
        let high = self.pin.is_high()?;
        let edge = high && !self.last_high;
        self.last_high = high;
        Ok(edge)
    }

    /// Sample the pin and run [`on_motion`] on a rising edge.
    pub fn poll(&mut self, slot: &RequestSlot) -> Result<Option<MotionOutcome>, P::Error> {
        if self.rising_edge()? {
            Ok(Some(on_motion(self.side, slot)))
        } else {
            Ok(None)
        }
    }
}
