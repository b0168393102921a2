//! Outbound application events.
//!
//! The [`AlarmService`](super::service::AlarmService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::fsm::{AlarmState, TimerKind};
use crate::sensors::motion::{MotionOutcome, Side};

use super::ports::LinkEvent;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries initial state).
    Started(AlarmState),

    /// A transition was committed.
    StateChanged {
        from: AlarmState,
        to: AlarmState,
        status: u8,
    },

    /// The status byte was handed to the status port.
    StatusPublished(u8),

    /// A window elapsed and requested the fall back to Idle.
    TimerExpired(TimerKind),

    /// The radio reported a connection change.
    Link(LinkEvent),

    /// A polled motion line produced an edge.
    Motion { side: Side, outcome: MotionOutcome },
}
