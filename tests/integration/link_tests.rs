//! Integration tests for the BLE link surface.
//!
//! Connection churn must never touch alarm state, and the simulated BLE
//! adapter must behave as both link and status port for the service.

use motionalert::adapters::ble::{BleAdapter, BleState};
use motionalert::adapters::device_id::{advertised_name, read_ble_mac};
use motionalert::app::events::AppEvent;
use motionalert::app::ports::{LinkEvent, PeerAddress};
use motionalert::app::service::{AlarmService, MAX_LINK_EVENTS_PER_TICK};
use motionalert::config::AlarmConfig;
use motionalert::events::RequestSlot;
use motionalert::fsm::AlarmState;
use motionalert::sensors::motion::{on_motion, Side};

use crate::mock_hw::{MockClock, MockLink, RecordingSink};

const PHONE: PeerAddress = PeerAddress([0xa4, 0xc1, 0x38, 0x00, 0x10, 0x2f]);

fn ble_adapter() -> BleAdapter {
    let config = AlarmConfig::default();
    let name = advertised_name(&config.device_name_prefix, &read_ble_mac());
    let mut ble = BleAdapter::new(name);
    ble.start().unwrap();
    ble
}

// ── Link events vs. alarm state ──────────────────────────────

#[test]
fn connection_churn_leaves_alarm_untouched() {
    let slot = RequestSlot::new();
    let mut sink = RecordingSink::new();
    let mut service = AlarmService::new(&AlarmConfig::default(), &slot);
    service.start(&mut sink);
    let mut link = MockLink::new();
    let clock = MockClock::at(0);

    on_motion(Side::Outside, &slot);
    service.tick(&mut link, &clock, &mut sink);
    assert_eq!(service.state(), AlarmState::Pending);

    link.queue(LinkEvent::Connected(PHONE));
    link.queue(LinkEvent::Disconnected(PHONE));
    clock.advance(100);
    service.tick(&mut link, &clock, &mut sink);

    assert_eq!(service.state(), AlarmState::Pending);
    assert_eq!(service.status_byte(), 0x02);
    assert_eq!(link.published, vec![0x02]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Link(_))),
        2,
        "both link events are logged"
    );
}

#[test]
fn link_drain_is_bounded_per_tick() {
    let slot = RequestSlot::new();
    let mut sink = RecordingSink::new();
    let mut service = AlarmService::new(&AlarmConfig::default(), &slot);
    service.start(&mut sink);
    let mut link = MockLink::new();
    let clock = MockClock::at(0);

    for _ in 0..(MAX_LINK_EVENTS_PER_TICK + 2) {
        link.queue(LinkEvent::Connected(PHONE));
    }
    on_motion(Side::Inside, &slot);
    service.tick(&mut link, &clock, &mut sink);

    // The transition still runs in the same iteration.
    assert_eq!(service.state(), AlarmState::Pending);
    assert_eq!(link.pending.len(), 2);

    service.tick(&mut link, &clock, &mut sink);
    assert!(link.pending.is_empty());
}

#[test]
fn link_events_precede_the_transition_in_the_log() {
    let slot = RequestSlot::new();
    let mut sink = RecordingSink::new();
    let mut service = AlarmService::new(&AlarmConfig::default(), &slot);
    service.start(&mut sink);
    let mut link = MockLink::new();
    let clock = MockClock::at(0);

    link.queue(LinkEvent::Connected(PHONE));
    on_motion(Side::Inside, &slot);
    service.tick(&mut link, &clock, &mut sink);

    assert_eq!(
        &sink.events[1..],
        &[
            AppEvent::Link(LinkEvent::Connected(PHONE)),
            AppEvent::StateChanged {
                from: AlarmState::Idle,
                to: AlarmState::Pending,
                status: 0x01,
            },
            AppEvent::StatusPublished(0x01),
        ]
    );
}

// ── Simulated BLE adapter as the service's link ──────────────

#[test]
fn ble_adapter_serves_latest_status() {
    let slot = RequestSlot::new();
    let mut sink = RecordingSink::new();
    let mut service = AlarmService::new(&AlarmConfig::default(), &slot);
    service.start(&mut sink);
    let mut ble = ble_adapter();
    let clock = MockClock::at(0);

    assert!(ble.device_name().starts_with("motionalert-"));
    assert_eq!(ble.status_value(), 0x00);

    on_motion(Side::Outside, &slot);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.status_value(), 0x02);
    // Nobody connected yet: the value is readable but not indicated.
    assert_eq!(ble.sim_indications(), 0);

    clock.set(2_500);
    service.tick(&mut ble, &clock, &mut sink);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.status_value(), 0x00);
}

#[test]
fn ble_adapter_indicates_to_connected_central() {
    let slot = RequestSlot::new();
    let mut sink = RecordingSink::new();
    let mut service = AlarmService::new(&AlarmConfig::default(), &slot);
    service.start(&mut sink);
    let mut ble = ble_adapter();
    let clock = MockClock::at(0);

    ble.inject_link_event(LinkEvent::Connected(PHONE));
    on_motion(Side::Inside, &slot);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.state(), BleState::Connected);
    assert_eq!(ble.sim_indications(), 1);

    on_motion(Side::Inside, &slot);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(service.state(), AlarmState::Alert);
    assert_eq!(ble.sim_indications(), 2);

    // Central leaves mid-alert: the adapter re-advertises, the alarm runs on.
    ble.inject_link_event(LinkEvent::Disconnected(PHONE));
    clock.set(4_000);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(ble.state(), BleState::Advertising);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(service.state(), AlarmState::Idle);
    assert_eq!(ble.status_value(), 0x00);
    assert_eq!(ble.sim_indications(), 2);
}

#[test]
fn stopped_adapter_does_not_stall_the_alarm() {
    let slot = RequestSlot::new();
    let mut sink = RecordingSink::new();
    let mut service = AlarmService::new(&AlarmConfig::default(), &slot);
    service.start(&mut sink);
    let mut ble = ble_adapter();
    ble.stop();
    let clock = MockClock::at(0);

    on_motion(Side::Inside, &slot);
    service.tick(&mut ble, &clock, &mut sink);
    assert_eq!(service.state(), AlarmState::Pending);
    assert_eq!(ble.state(), BleState::Idle);
    assert_eq!(ble.status_value(), 0x01);
    assert_eq!(ble.sim_indications(), 0);
}
