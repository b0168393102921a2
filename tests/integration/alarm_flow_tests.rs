//! Integration tests for the motion → AlarmService → status port pipeline.
//!
//! Motion edges go through the same `on_motion` handler the GPIO ISRs call;
//! time is driven by a mock clock, so every window boundary is exact.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin};

use motionalert::app::events::AppEvent;
use motionalert::app::service::AlarmService;
use motionalert::config::AlarmConfig;
use motionalert::events::RequestSlot;
use motionalert::fsm::{AlarmState, TimerKind};
use motionalert::sensors::motion::{on_motion, MotionLine, MotionOutcome, Side};

use crate::mock_hw::{MockClock, MockLink, RecordingSink};

const PENDING_MS: u32 = 2_500;
const ALERT_MS: u32 = 4_000;

struct Rig<'a> {
    service: AlarmService<'a>,
    link: MockLink,
    clock: MockClock,
    sink: RecordingSink,
}

impl<'a> Rig<'a> {
    fn new(slot: &'a RequestSlot, start_ms: u32) -> Self {
        Self::with_config(slot, start_ms, &AlarmConfig::default())
    }

    fn with_config(slot: &'a RequestSlot, start_ms: u32, config: &AlarmConfig) -> Self {
        let mut sink = RecordingSink::new();
        let mut service = AlarmService::new(config, slot);
        service.start(&mut sink);
        Self {
            service,
            link: MockLink::new(),
            clock: MockClock::at(start_ms),
            sink,
        }
    }

    fn tick(&mut self) {
        self.service
            .tick(&mut self.link, &self.clock, &mut self.sink);
    }

    /// Advance to `ms` after the rig's epoch and run one iteration.
    fn tick_at(&mut self, ms: u32) {
        self.clock.set(ms);
        self.tick();
    }
}

// ── Full cycle: Idle → Pending → Alert → Idle ────────────────

#[test]
fn confirmed_intrusion_publishes_side_side_zero() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 0);

    on_motion(Side::Inside, &slot);
    rig.tick_at(10);
    assert_eq!(rig.service.state(), AlarmState::Pending);

    on_motion(Side::Outside, &slot);
    rig.tick_at(1_000);
    assert_eq!(rig.service.state(), AlarmState::Alert);
    assert_eq!(rig.service.status_byte(), 0x01, "side from Pending entry is kept");

    rig.tick_at(1_000 + ALERT_MS - 1);
    assert_eq!(rig.service.state(), AlarmState::Alert);

    rig.tick_at(1_000 + ALERT_MS);
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::TimerExpired(TimerKind::Alert))
    );
    rig.tick();

    assert_eq!(rig.service.state(), AlarmState::Idle);
    assert_eq!(rig.link.published, vec![0x01, 0x01, 0x00]);
}

// ── Pending window elapses without confirmation ──────────────

#[test]
fn unconfirmed_motion_publishes_side_zero() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 5_000);

    on_motion(Side::Outside, &slot);
    rig.tick();
    rig.tick_at(5_000 + PENDING_MS - 1);
    assert_eq!(rig.service.state(), AlarmState::Pending);

    rig.tick_at(5_000 + PENDING_MS);
    rig.tick();

    assert_eq!(rig.service.state(), AlarmState::Idle);
    assert_eq!(rig.link.published, vec![0x02, 0x00]);
    let alerts = rig.sink.count(|e| {
        matches!(e, AppEvent::StateChanged { to: AlarmState::Alert, .. })
    });
    assert_eq!(alerts, 0, "Alert must never be entered");
}

// ── Last-write-wins between two idle edges ───────────────────

#[test]
fn second_idle_edge_decides_the_side() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 0);

    on_motion(Side::Inside, &slot);
    on_motion(Side::Outside, &slot);
    rig.tick();

    assert_eq!(rig.service.state(), AlarmState::Pending);
    assert_eq!(rig.link.published, vec![0x02]);
}

// ── Alert latch ignores further motion ───────────────────────

#[test]
fn motion_during_alert_is_ignored() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 0);

    on_motion(Side::Inside, &slot);
    rig.tick();
    on_motion(Side::Inside, &slot);
    rig.tick_at(100);
    assert_eq!(rig.service.state(), AlarmState::Alert);

    for t in [200, 1_000, 3_000] {
        assert_eq!(on_motion(Side::Outside, &slot), MotionOutcome::Ignored);
        rig.tick_at(t);
    }
    assert_eq!(rig.service.status_byte(), 0x01);
    assert_eq!(rig.link.published, vec![0x01, 0x01]);

    // The latch is measured from Alert entry, not from the last edge.
    rig.tick_at(100 + ALERT_MS);
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Idle);
}

// ── Repeated cycles re-arm cleanly ───────────────────────────

#[test]
fn back_to_back_cycles_use_fresh_windows() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 0);

    on_motion(Side::Inside, &slot);
    rig.tick();
    rig.tick_at(PENDING_MS);
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Idle);

    // Long after the first window: a new Pending must not expire at once.
    let t0 = 50_000;
    on_motion(Side::Outside, &slot);
    rig.tick_at(t0);
    rig.tick_at(t0 + 1);
    assert_eq!(rig.service.state(), AlarmState::Pending);
    assert_eq!(rig.service.status_byte(), 0x02);

    rig.tick_at(t0 + PENDING_MS);
    rig.tick();
    assert_eq!(rig.link.published, vec![0x01, 0x00, 0x02, 0x00]);
}

// ── Clock wraparound ─────────────────────────────────────────

#[test]
fn windows_survive_counter_wraparound() {
    let slot = RequestSlot::new();
    let start = u32::MAX - 1_000;
    let mut rig = Rig::new(&slot, start);

    on_motion(Side::Inside, &slot);
    rig.tick();
    on_motion(Side::Outside, &slot);
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Alert);

    rig.tick_at(start.wrapping_add(ALERT_MS - 1));
    assert_eq!(rig.service.state(), AlarmState::Alert);
    rig.tick_at(start.wrapping_add(ALERT_MS));
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Idle);
    assert_eq!(rig.link.published, vec![0x01, 0x01, 0x00]);
}

// ── Configured windows ───────────────────────────────────────

#[test]
fn configured_windows_are_honoured() {
    let config =
        AlarmConfig::from_json(r#"{"pending_window_ms": 500, "alert_window_ms": 800}"#).unwrap();
    let slot = RequestSlot::new();
    let mut rig = Rig::with_config(&slot, 0, &config);

    on_motion(Side::Outside, &slot);
    rig.tick();
    rig.tick_at(499);
    assert_eq!(rig.service.state(), AlarmState::Pending);
    rig.tick_at(500);
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Idle);

    on_motion(Side::Inside, &slot);
    rig.tick_at(1_000);
    on_motion(Side::Inside, &slot);
    rig.tick_at(1_100);
    rig.tick_at(1_899);
    assert_eq!(rig.service.state(), AlarmState::Alert);
    rig.tick_at(1_900);
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Idle);
}

// ── Event log ────────────────────────────────────────────────

#[test]
fn every_transition_is_logged_and_published() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 0);

    on_motion(Side::Inside, &slot);
    rig.tick();
    on_motion(Side::Inside, &slot);
    rig.tick();
    rig.tick_at(ALERT_MS);
    rig.tick();

    let changes: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to, status } => Some((*from, *to, *status)),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            (AlarmState::Idle, AlarmState::Pending, 0x01),
            (AlarmState::Pending, AlarmState::Alert, 0x01),
            (AlarmState::Alert, AlarmState::Idle, 0x00),
        ]
    );
    assert_eq!(rig.sink.events[0], AppEvent::Started(AlarmState::Idle));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::StatusPublished(_))),
        3
    );
    assert_eq!(rig.service.tick_count(), 4);
}

// ── Polled inputs ────────────────────────────────────────────

struct LevelPin<'a>(&'a core::cell::Cell<bool>);

impl ErrorType for LevelPin<'_> {
    type Error = Infallible;
}

impl InputPin for LevelPin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

#[test]
fn polled_lines_feed_the_same_pipeline() {
    let slot = RequestSlot::new();
    let mut rig = Rig::new(&slot, 0);
    let inside_level = core::cell::Cell::new(false);
    let outside_level = core::cell::Cell::new(false);
    let mut inside = MotionLine::new(Side::Inside, LevelPin(&inside_level)).unwrap();
    let mut outside = MotionLine::new(Side::Outside, LevelPin(&outside_level)).unwrap();

    outside_level.set(true);
    rig.service.poll_motion(&mut inside, &mut rig.sink).unwrap();
    rig.service.poll_motion(&mut outside, &mut rig.sink).unwrap();
    rig.tick();
    assert_eq!(rig.service.state(), AlarmState::Pending);
    assert!(rig.sink.events.contains(&AppEvent::Motion {
        side: Side::Outside,
        outcome: MotionOutcome::RequestedPending,
    }));

    // Held high: no second edge.
    rig.service.poll_motion(&mut outside, &mut rig.sink).unwrap();
    rig.tick_at(10);
    assert_eq!(rig.service.state(), AlarmState::Pending);

    inside_level.set(true);
    rig.service.poll_motion(&mut inside, &mut rig.sink).unwrap();
    rig.tick_at(20);
    assert_eq!(rig.service.state(), AlarmState::Alert);
    assert_eq!(rig.link.published, vec![0x02, 0x02]);
}
