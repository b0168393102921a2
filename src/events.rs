//! Interrupt-to-main-loop transition slot.
//!
//! Motion ISRs are the producers, the control loop is the single consumer.
//! Instead of a queue, the boundary is one word-sized cell that holds the
//! most recent requested transition:
//!
//! ```text
//! ┌──────────────┐  store   ┌──────────────────┐  swap(EMPTY)  ┌──────────────┐
//! │ Inside ISR   │─────────▶│                  │──────────────▶│              │
//! │ Outside ISR  │─────────▶│   RequestSlot    │               │ Control loop │
//! │ Timer expiry │─────────▶│  (one AtomicU8)  │◀──────────────│  (commit)    │
//! └──────────────┘          └──────────────────┘ current state └──────────────┘
//! ```
//!
//! A newer request overwrites an unconsumed older one (last write wins).
//! The requested state and its side flag share a single byte, so an ISR
//! publishes both with one atomic store and the loop can never observe a
//! torn pair.
//!
//! The slot also mirrors the committed current state.  Only the control
//! loop writes that mirror; ISRs read it to decide which request to post.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::fsm::AlarmState;
use crate::sensors::motion::Side;

/// Raw value of an empty request cell.
const EMPTY: u8 = 0;
/// Low bits: target state index + 1 (so zero stays "empty").
const STATE_MASK: u8 = 0b0000_0011;
/// High nibble: side flag carried by a `Pending` request.
const SIDE_SHIFT: u32 = 4;

/// A transition requested by an ISR or by timer expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Motion seen while idle; carries the side that saw it.
    Pending(Side),
    /// Confirming motion seen while pending.
    Alert,
    /// A window elapsed; fall back to idle.
    Idle,
}

impl Request {
    /// State the control loop should enter for this request.
    pub const fn target(self) -> AlarmState {
        match self {
            Self::Pending(_) => AlarmState::Pending,
            Self::Alert => AlarmState::Alert,
            Self::Idle => AlarmState::Idle,
        }
    }

    const fn encode(self) -> u8 {
        let state = self.target() as u8 + 1;
        match self {
            Self::Pending(side) => state | (side.flag() << SIDE_SHIFT),
            Self::Alert | Self::Idle => state,
        }
    }

    fn decode(raw: u8) -> Option<Self> {
        let index = (raw & STATE_MASK).checked_sub(1)?;
        match AlarmState::from_repr(index)? {
            AlarmState::Idle => Some(Self::Idle),
            AlarmState::Alert => Some(Self::Alert),
            AlarmState::Pending => Side::from_flag(raw >> SIDE_SHIFT).map(Self::Pending),
        }
    }
}

/// Single-slot, lock-free exchange between ISR context and the main loop.
pub struct RequestSlot {
    request: AtomicU8,
    current: AtomicU8,
}

impl RequestSlot {
    /// An empty slot with the mirror at `Idle`.  `const` so it can back a
    /// `static` that ISR callbacks reach without captures.
    pub const fn new() -> Self {
        Self {
            request: AtomicU8::new(EMPTY),
            current: AtomicU8::new(AlarmState::Idle as u8),
        }
    }

    /// Post a request, replacing any unconsumed one.
    /// Safe to call from ISR context (single atomic store).
    pub fn request(&self, request: Request) {
        self.request.store(request.encode(), Ordering::Release);
    }

    /// Load-and-clear the outstanding request.  Control loop only.
    pub fn take(&self) -> Option<Request> {
        Request::decode(self.request.swap(EMPTY, Ordering::AcqRel))
    }

    /// Inspect the outstanding request without consuming it.
    pub fn peek(&self) -> Option<Request> {
        Request::decode(self.request.load(Ordering::Acquire))
    }

    /// The state most recently committed by the control loop.
    pub fn current(&self) -> AlarmState {
        AlarmState::from_index(self.current.load(Ordering::Acquire) as usize)
    }

    /// Publish the committed state to ISR readers.  Control loop only.
    pub fn commit(&self, state: AlarmState) {
        self.current.store(state as u8, Ordering::Release);
    }
}

impl Default for RequestSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// The slot shared by the GPIO motion ISRs and the firmware main loop.
pub static ALARM_REQUESTS: RequestSlot = RequestSlot::new();
