//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AlarmService (domain)
//! ```
//!
//! Driven adapters (radio link, clock, event sinks) implement these traits.
//! The [`AlarmService`](super::service::AlarmService) consumes them via
//! generics, so the domain core never touches hardware directly.

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Status port (driven adapter: domain → peer)
// ───────────────────────────────────────────────────────────────

/// Pushes the alarm status byte to the connected peer.
pub trait StatusPort {
    /// Store `status` as the readable value and notify a subscribed peer.
    /// Called once per committed transition, after the state is committed.
    fn publish(&mut self, status: u8);
}

// ───────────────────────────────────────────────────────────────
// Link port (driving adapter: radio → domain)
// ───────────────────────────────────────────────────────────────

/// 48-bit Bluetooth device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PeerAddress(pub [u8; 6]);

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Connection lifecycle notifications.  Logged by the core, otherwise
/// ignored; reconnection is the adapter's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Connected(PeerAddress),
    Disconnected(PeerAddress),
}

/// Non-blocking view of the radio's connection events.
pub trait LinkPort {
    /// Return the next queued event, or `None` if nothing happened.
    fn poll(&mut self) -> Option<LinkEvent>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond counter, truncated to `u32` (wraps after ~49.7 days).
pub trait ClockPort {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
