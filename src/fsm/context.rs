//! Mutable context threaded through every entry action.
//!
//! `AlarmContext` is the only data the state table's entry actions may
//! touch.  It owns both timers, the side recorded at Pending entry and the
//! status byte; the outbox carries the byte an entry action wants published
//! back to the controller, which hands it to the status port once the
//! transition is fully committed.

use super::timer::Timer;
use crate::config::AlarmConfig;
use crate::sensors::motion::Side;

pub struct AlarmContext {
    // -- Timing --
    /// Clock reading at which the current transition is being applied.
    pub now_ms: u32,
    /// Confirmation window started on Pending entry.
    pub pending_timer: Timer,
    /// Latch window started on Alert entry.
    pub alert_timer: Timer,

    // -- Status --
    /// Side recorded at the most recent Idle→Pending transition.
    pub side: Option<Side>,
    /// Side carried by the request being applied (Pending requests only).
    pub incoming_side: Option<Side>,
    /// Wire value exposed to the peer.
    pub status: u8,

    /// Byte to publish after the transition commits.
    pub outbox: Option<u8>,
}

impl AlarmContext {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            now_ms: 0,
            pending_timer: Timer::new(config.pending_window_ms),
            alert_timer: Timer::new(config.alert_window_ms),
            side: None,
            incoming_side: None,
            status: 0,
            outbox: None,
        }
    }

    /// Status byte implied by the recorded side.
    pub fn side_status(&self) -> u8 {
        self.side.map_or(0, Side::flag)
    }
}
