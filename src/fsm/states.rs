//! Entry actions and table builder.
//!
//! ```text
//!  IDLE ──[motion, side S]──▶ PENDING(S) ──[motion, any side]──▶ ALERT(S)
//!    ▲                            │                                 │
//!    └────[pending window]────────┘                                 │
//!    └────────────────────────────[alert window]────────────────────┘
//! ```
//!
//! Every entry action leaves the byte it wants published in `ctx.outbox`.

use super::context::AlarmContext;
use super::{AlarmState, StateDescriptor};
use crate::sensors::motion::Side;
use log::{info, warn};

/// Build the state table.  Called once when the controller is created.
pub fn build_state_table() -> [StateDescriptor; AlarmState::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: AlarmState::Idle,
            name: "Idle",
            on_enter: idle_enter,
        },
        // Index 1: Pending
        StateDescriptor {
            id: AlarmState::Pending,
            name: "Pending",
            on_enter: pending_enter,
        },
        // Index 2: Alert
        StateDescriptor {
            id: AlarmState::Alert,
            name: "Alert",
            on_enter: alert_enter,
        },
    ]
}

fn idle_enter(ctx: &mut AlarmContext) {
    ctx.pending_timer.disarm();
    ctx.alert_timer.disarm();
    ctx.side = None;
    ctx.status = 0;
    ctx.outbox = Some(ctx.status);
    info!("IDLE: watching both sensors");
}

fn pending_enter(ctx: &mut AlarmContext) {
    ctx.side = ctx.incoming_side;
    if ctx.side.is_none() {
        // Unreachable through `RequestSlot`; status must stay non-zero
        // outside Idle.
        warn!("PENDING: request carried no side, assuming inside");
        ctx.side = Some(Side::Inside);
    }
    ctx.status = ctx.side_status();
    ctx.pending_timer.arm(ctx.now_ms);
    ctx.outbox = Some(ctx.status);
    info!(
        "PENDING: motion {}, confirming for {} ms",
        ctx.side.map_or("?", |s| s.name()),
        ctx.pending_timer.duration()
    );
}

fn alert_enter(ctx: &mut AlarmContext) {
    ctx.pending_timer.disarm();
    ctx.status = ctx.side_status();
    ctx.alert_timer.arm(ctx.now_ms);
    ctx.outbox = Some(ctx.status);
    info!(
        "ALERT: intrusion confirmed (status=0x{:02x}), latching {} ms",
        ctx.status,
        ctx.alert_timer.duration()
    );
}
