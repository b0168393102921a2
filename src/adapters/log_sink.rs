//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use core::fmt::Write;

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, LinkEvent};

/// One rendered log line.
pub type LogLine = heapless::String<64>;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Format an event as `TAG | detail`.  Over-long lines are truncated.
pub fn render(event: &AppEvent) -> LogLine {
    let mut line = LogLine::new();
    let _ = match event {
        AppEvent::Started(state) => write!(line, "START | initial_state={state}"),
        AppEvent::StateChanged { from, to, status } => {
            write!(line, "STATE | {from} -> {to} | status=0x{status:02x}")
        }
        AppEvent::StatusPublished(status) => write!(line, "NOTIFY | status=0x{status:02x}"),
        AppEvent::TimerExpired(kind) => write!(line, "TIMER | {} window elapsed", kind.name()),
        AppEvent::Link(LinkEvent::Connected(peer)) => write!(line, "LINK | connected {peer}"),
        AppEvent::Link(LinkEvent::Disconnected(peer)) => {
            write!(line, "LINK | disconnected {peer}")
        }
        AppEvent::Motion { side, outcome } => {
            write!(line, "MOTION | {} | {:?}", side.name(), outcome)
        }
    };
    line
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        info!("{}", render(event));
    }
}
