//! Function-pointer alarm state machine.
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │  StateTable                               │
//! │  ┌──────────┬───────────┬──────────────┐  │
//! │  │ State    │ name      │ on_enter     │  │
//! │  ├──────────┼───────────┼──────────────┤  │
//! │  │ Idle     │ "Idle"    │ fn(ctx)      │  │
//! │  │ Pending  │ "Pending" │ fn(ctx)      │  │
//! │  │ Alert    │ "Alert"   │ fn(ctx)      │  │
//! │  └──────────┴───────────┴──────────────┘  │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Transitions are not decided here.  Motion ISRs and timer expiry post
//! requests into a [`RequestSlot`]; each control-loop iteration the
//! controller takes the outstanding request, and if it names a different
//! state than the current one, runs that state's `on_enter` and commits it.
//! That comparison and the single `current = target` assignment are the only
//! place the state changes.

pub mod context;
pub mod states;
pub mod timer;

use context::AlarmContext;
use log::{debug, info};

use crate::config::AlarmConfig;
use crate::events::{Request, RequestSlot};
use crate::sensors::motion::Side;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// The three alarm states.  Must stay in sync with
/// [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlarmState {
    Idle = 0,
    Pending = 1,
    Alert = 2,
}

impl AlarmState {
    /// Total number of states, sizes the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `AlarmState`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Pending,
            2 => Self::Alert,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    /// Checked conversion from a raw discriminant.
    pub const fn from_repr(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Idle),
            1 => Some(Self::Pending),
            2 => Some(Self::Alert),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pending => "Pending",
            Self::Alert => "Alert",
        }
    }

    /// Whether the state graph has an edge from `self` to `next`.
    ///
    /// Idle→Pending, Pending→Alert, Pending→Idle, Alert→Idle.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Pending)
                | (Self::Pending, Self::Alert)
                | (Self::Pending, Self::Idle)
                | (Self::Alert, Self::Idle)
        )
    }
}

impl core::fmt::Display for AlarmState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// Signature for entry actions.  Runs exactly once per transition.
pub type EntryActionFn = fn(&mut AlarmContext);

/// Static descriptor for one state.  Stored in a fixed-size array.
pub struct StateDescriptor {
    pub id: AlarmState,
    pub name: &'static str,
    pub on_enter: EntryActionFn,
}

// ---------------------------------------------------------------------------
// Controller outputs
// ---------------------------------------------------------------------------

/// Which window elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Pending,
    Alert,
}

impl TimerKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Alert => "alert",
        }
    }
}

/// A committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AlarmState,
    pub to: AlarmState,
    /// Status byte the entry action asked to publish.
    pub publish: Option<u8>,
}

/// Timers that expired during one [`AlarmController::service_timers`] call.
pub type ExpiredTimers = heapless::Vec<TimerKind, 2>;

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the state table, the current state and the [`AlarmContext`].
///
/// Not shared with interrupt context: ISRs only see the [`RequestSlot`]
/// passed into each call.
pub struct AlarmController {
    table: [StateDescriptor; AlarmState::COUNT],
    current: usize,
    ctx: AlarmContext,
    transitions: u32,
}

impl AlarmController {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            table: states::build_state_table(),
            current: AlarmState::Idle as usize,
            ctx: AlarmContext::new(config),
            transitions: 0,
        }
    }

    /// Publish the initial state to the slot's mirror.  Call once before
    /// the first [`apply_pending`](Self::apply_pending).
    pub fn start(&mut self, slot: &RequestSlot) {
        info!(
            "Alarm starting in state: {} (pending window {} ms, alert window {} ms)",
            self.table[self.current].name,
            self.ctx.pending_timer.duration(),
            self.ctx.alert_timer.duration()
        );
        slot.commit(self.state());
    }

    /// Consume the outstanding request, if any, and perform the transition.
    ///
    /// Returns `None` when nothing was requested, when the request names
    /// the current state, or when the state graph has no such edge (a
    /// request that raced a commit).
    pub fn apply_pending(&mut self, now_ms: u32, slot: &RequestSlot) -> Option<Transition> {
        let request = slot.take()?;
        let from = self.state();
        let to = request.target();

        if to == from {
            return None;
        }
        if !from.can_transition_to(to) {
            debug!("Dropping stale request {request:?} in state {from}");
            return None;
        }

        self.ctx.now_ms = now_ms;
        self.ctx.incoming_side = match request {
            Request::Pending(side) => Some(side),
            Request::Alert | Request::Idle => None,
        };
        self.ctx.outbox = None;

        info!("Alarm transition: {} -> {}", from.name(), to.name());
        (self.table[to as usize].on_enter)(&mut self.ctx);

        self.current = to as usize;
        self.transitions = self.transitions.wrapping_add(1);
        slot.commit(to);

        Some(Transition {
            from,
            to,
            publish: self.ctx.outbox.take(),
        })
    }

    /// Check both windows against `now_ms`; each expiry posts an `Idle`
    /// request that the next [`apply_pending`](Self::apply_pending) applies.
    pub fn service_timers(&mut self, now_ms: u32, slot: &RequestSlot) -> ExpiredTimers {
        let mut expired = ExpiredTimers::new();

        if self.ctx.pending_timer.is_expired(now_ms) {
            slot.request(Request::Idle);
            let _ = expired.push(TimerKind::Pending);
        }
        if self.ctx.alert_timer.is_expired(now_ms) {
            slot.request(Request::Idle);
            let _ = expired.push(TimerKind::Alert);
        }

        expired
    }

    pub fn state(&self) -> AlarmState {
        AlarmState::from_index(self.current)
    }

    pub fn status_byte(&self) -> u8 {
        self.ctx.status
    }

    /// Side recorded at the most recent Idle→Pending transition, while not
    /// idle.
    pub fn side(&self) -> Option<Side> {
        self.ctx.side
    }

    /// Number of committed transitions since boot (wrapping).
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn context(&self) -> &AlarmContext {
        &self.ctx
    }
}
