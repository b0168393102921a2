//! Application service: the hexagonal core.
//!
//! [`AlarmService`] owns the alarm controller and borrows the request slot
//! shared with the motion ISRs.  All I/O flows through port traits
//! injected at call sites, making the service testable with mock adapters.
//!
//! ```text
//!   LinkPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                │      AlarmService      │
//! StatusPort ◀── │  controller · timers   │ ◀── ClockPort
//!                └────────────────────────┘
//!                           ▲
//!                      RequestSlot ◀── motion ISRs
//! ```

use embedded_hal::digital::InputPin;
use log::info;

use crate::config::AlarmConfig;
use crate::events::RequestSlot;
use crate::fsm::{AlarmController, AlarmState};
use crate::sensors::motion::MotionLine;

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, LinkPort, StatusPort};

/// Upper bound on link events drained per iteration so a chatty radio
/// cannot starve the state machine.
pub const MAX_LINK_EVENTS_PER_TICK: usize = 4;

// ───────────────────────────────────────────────────────────────
// AlarmService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AlarmService<'a> {
    controller: AlarmController,
    slot: &'a RequestSlot,
    tick_count: u64,
}

impl<'a> AlarmService<'a> {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the controller; call [`start`](Self::start) next.
    pub fn new(config: &AlarmConfig, slot: &'a RequestSlot) -> Self {
        Self {
            controller: AlarmController::new(config),
            slot,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Commit the initial Idle state so ISRs start branching on it.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.controller.start(self.slot);
        sink.emit(&AppEvent::Started(self.controller.state()));
        info!("AlarmService started in {:?}", self.controller.state());
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one control-loop iteration: link → transition → timers.
    ///
    /// The `link` parameter satisfies **both** [`LinkPort`] and
    /// [`StatusPort`]; on the device both are the same BLE adapter.
    /// Never blocks.
    pub fn tick(
        &mut self,
        link: &mut (impl LinkPort + StatusPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count = self.tick_count.wrapping_add(1);

        // 1. Service the radio
        for _ in 0..MAX_LINK_EVENTS_PER_TICK {
            match link.poll() {
                Some(event) => sink.emit(&AppEvent::Link(event)),
                None => break,
            }
        }

        // 2. Apply the outstanding transition, publish once committed
        if let Some(t) = self.controller.apply_pending(clock.now_ms(), self.slot) {
            sink.emit(&AppEvent::StateChanged {
                from: t.from,
                to: t.to,
                status: self.controller.status_byte(),
            });
            if let Some(status) = t.publish {
                link.publish(status);
                sink.emit(&AppEvent::StatusPublished(status));
            }
        }

        // 3. Timers; expiry posts Idle for the next iteration
        for kind in self.controller.service_timers(clock.now_ms(), self.slot) {
            sink.emit(&AppEvent::TimerExpired(kind));
        }
    }

    /// Sample a polled motion line and feed any edge to the slot.
    pub fn poll_motion<P: InputPin>(
        &self,
        line: &mut MotionLine<P>,
        sink: &mut impl EventSink,
    ) -> Result<(), P::Error> {
        if let Some(outcome) = line.poll(self.slot)? {
            sink.emit(&AppEvent::Motion {
                side: line.side(),
                outcome,
            });
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> AlarmState {
        self.controller.state()
    }

    pub fn status_byte(&self) -> u8 {
        self.controller.status_byte()
    }

    /// Control-loop iterations since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn controller(&self) -> &AlarmController {
        &self.controller
    }
}
