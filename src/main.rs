//! Motion-Alert Firmware: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  BleAdapter            LogEventSink     SystemClock            │
//! │  (StatusPort+LinkPort) (EventSink)      (ClockPort)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           AlarmService (pure logic)                    │    │
//! │  │  AlarmController · Timers                              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                              ▲                                 │
//! │        RequestSlot ◀── motion ISRs (GPIO 3 inside, 2 outside)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use motionalert::adapters::ble::BleAdapter;
use motionalert::adapters::device_id;
use motionalert::adapters::log_sink::LogEventSink;
use motionalert::adapters::time::SystemClock;
use motionalert::app::service::AlarmService;
use motionalert::config::AlarmConfig;
use motionalert::drivers::hw_init::{self, RawInputPin};
use motionalert::drivers::watchdog::Watchdog;
use motionalert::events::ALARM_REQUESTS;
use motionalert::pins;
use motionalert::sensors::motion::{MotionLine, Side};

/// Build-time JSON override, e.g. `MOTIONALERT_CONFIG='{"alert_window_ms":8000}'`.
const CONFIG_OVERRIDE: Option<&str> = option_env!("MOTIONALERT_CONFIG");

/// Fail-stop: log once and park the main task forever.
fn halt(reason: &dyn core::fmt::Display) -> ! {
    error!("FATAL: {}, halting", reason);
    loop {
        esp_idf_hal::delay::FreeRtos::delay_ms(1_000);
    }
}

fn load_config() -> AlarmConfig {
    match CONFIG_OVERRIDE {
        None => AlarmConfig::default(),
        Some(json) => match AlarmConfig::from_json(json) {
            Ok(cfg) => {
                info!("Config: build-time override applied");
                cfg
            }
            Err(e) => {
                warn!("Config: override rejected ({}), using defaults", e);
                AlarmConfig::default()
            }
        },
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  MotionAlert v{}                   ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config();
    info!(
        "Config: pending={} ms, alert={} ms, inputs={}",
        config.pending_window_ms,
        config.alert_window_ms,
        if config.poll_inputs { "polled" } else { "interrupt" }
    );

    // ── 3. Device identity ────────────────────────────────────
    let mac = device_id::read_ble_mac();
    let name = device_id::advertised_name(&config.device_name_prefix, &mac);
    info!("BLE MAC: {} (name: {})", device_id::format_mac(&mac), name);

    // ── 4. Radio ──────────────────────────────────────────────
    let mut ble = BleAdapter::new(name);
    if let Err(e) = ble.start() {
        halt(&motionalert::error::Error::from(e));
    }

    // ── 5. Motion inputs ──────────────────────────────────────
    if let Err(e) = hw_init::init_motion_inputs(config.poll_inputs) {
        halt(&motionalert::error::Error::from(e));
    }

    let mut lines = None;
    if config.poll_inputs {
        // RawInputPin is infallible.
        let Ok(inside) = MotionLine::new(Side::Inside, RawInputPin(pins::INSIDE_PROX_GPIO));
        let Ok(outside) = MotionLine::new(Side::Outside, RawInputPin(pins::OUTSIDE_PROX_GPIO));
        lines = Some((inside, outside));
    } else if let Err(e) = hw_init::init_isr_service() {
        halt(&motionalert::error::Error::from(e));
    }

    // ── 6. Application service ────────────────────────────────
    let clock = SystemClock::new();
    let mut log_sink = LogEventSink::new();
    let mut service = AlarmService::new(&config, &ALARM_REQUESTS);
    service.start(&mut log_sink);

    // ── 7. Watchdog ───────────────────────────────────────────
    let mut watchdog = Watchdog::new();

    info!("System ready. Entering control loop.");

    // ── 8. Control loop (never sleeps) ────────────────────────
    loop {
        watchdog.feed();
        if let Some((inside, outside)) = lines.as_mut() {
            let Ok(()) = service.poll_motion(inside, &mut log_sink);
            let Ok(()) = service.poll_motion(outside, &mut log_sink);
        }
        service.tick(&mut ble, &clock, &mut log_sink);
    }
}
