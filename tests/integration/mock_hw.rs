//! Mock adapters for integration tests.
//!
//! Records every publish and event so tests can assert on the full history
//! without a radio, a GPIO bank or a real clock.

use core::cell::Cell;
use std::collections::VecDeque;

use motionalert::app::events::AppEvent;
use motionalert::app::ports::{ClockPort, EventSink, LinkEvent, LinkPort, StatusPort};

// ── MockLink ──────────────────────────────────────────────────

/// Stands in for the BLE adapter: queued link events in, published bytes out.
#[derive(Default)]
pub struct MockLink {
    pub published: Vec<u8>,
    pub pending: VecDeque<LinkEvent>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, event: LinkEvent) {
        self.pending.push_back(event);
    }

    pub fn last_published(&self) -> Option<u8> {
        self.published.last().copied()
    }
}

impl LinkPort for MockLink {
    fn poll(&mut self) -> Option<LinkEvent> {
        self.pending.pop_front()
    }
}

impl StatusPort for MockLink {
    fn publish(&mut self, status: u8) {
        self.published.push(status);
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Manually advanced millisecond clock.
pub struct MockClock {
    now: Cell<u32>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u32) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
