//! Concrete state handler functions and table builder.
//!
//! Each state is a row of plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[card]──▶ AUTHENTICATING ──[user found]──▶ AWAITING_OBJECT
//!    ▲                   │                                 │
//!    │          [not found / refused]                [object < threshold]
//!    │                   ▼                                 ▼
//!    ├──[hold done]── REJECTED ◀──────[rejected]──────── ANALYZING
//!    │                                                     │
//!    │                                                [accepted]
//!    │                                                     ▼
//!    └───────────────────[gate timer]───────────────── DISPENSING
//!
//!  Authenticating / AwaitingObject / Analyzing ──[user timeout]──▶ IDLE
//! ```

use super::context::{FsmContext, Outbound, Outcome, SessionSummary, ToneKind};
use super::timer::TimerKind;
use super::{Poll, StateDescriptor, StateId};
use crate::link::HostReply;
use crate::messages;
use log::{debug, info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            polls: Poll::CardReader,
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
            on_expire: None,
        },
        // Index 1 — Authenticating
        StateDescriptor {
            id: StateId::Authenticating,
            name: "Authenticating",
            polls: Poll::Nothing,
            on_enter: Some(authenticating_enter),
            on_exit: None,
            on_update: authenticating_update,
            on_expire: Some(user_timeout_expire),
        },
        // Index 2 — AwaitingObject
        StateDescriptor {
            id: StateId::AwaitingObject,
            name: "AwaitingObject",
            polls: Poll::Proximity,
            on_enter: Some(awaiting_object_enter),
            on_exit: None,
            on_update: awaiting_object_update,
            on_expire: Some(user_timeout_expire),
        },
        // Index 3 — Analyzing
        StateDescriptor {
            id: StateId::Analyzing,
            name: "Analyzing",
            polls: Poll::Nothing,
            on_enter: Some(analyzing_enter),
            on_exit: None,
            on_update: analyzing_update,
            on_expire: Some(user_timeout_expire),
        },
        // Index 4 — Dispensing
        StateDescriptor {
            id: StateId::Dispensing,
            name: "Dispensing",
            polls: Poll::Nothing,
            on_enter: Some(dispensing_enter),
            on_exit: Some(dispensing_exit),
            on_update: hold_update,
            on_expire: Some(hold_expire),
        },
        // Index 5 — Rejected
        StateDescriptor {
            id: StateId::Rejected,
            name: "Rejected",
            polls: Poll::Nothing,
            on_enter: Some(rejected_enter),
            on_exit: None,
            on_update: hold_update,
            on_expire: Some(hold_expire),
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands.gate_open = false;
    ctx.timers.disarm_all();

    if ctx.session.is_active() {
        let outcome = ctx.session.outcome.unwrap_or(Outcome::Timeout);
        ctx.finished = Some(SessionSummary {
            user_id: ctx.session.user_id.clone(),
            outcome,
            points: ctx.session.points,
        });

        if outcome == Outcome::Timeout {
            ctx.commands.show(messages::TIMEOUT_L1, messages::WELCOME_L2);
            ctx.commands.tone = Some(ToneKind::Error);
            ctx.notice_pending = true;
        } else {
            show_welcome(ctx);
        }
    } else {
        show_welcome(ctx);
    }

    ctx.session.clear();
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(card) = ctx.inputs.card.take() {
        info!("Idle: card {} presented", card);
        ctx.notice_pending = false;
        ctx.session.user_id = card;
        return Some(StateId::Authenticating);
    }

    if let Some(reply) = ctx.inputs.reply.take() {
        debug!("Idle: ignoring {:?} with no session", reply);
    }

    if ctx.notice_pending && ctx.ms_in_state() >= u64::from(ctx.config.notice_hold_ms) {
        show_welcome(ctx);
    }

    None
}

fn show_welcome(ctx: &mut FsmContext) {
    ctx.commands.show(messages::WELCOME_L1, messages::WELCOME_L2);
    ctx.notice_pending = false;
}

// ═══════════════════════════════════════════════════════════════════════════
//  AUTHENTICATING state
// ═══════════════════════════════════════════════════════════════════════════

fn authenticating_enter(ctx: &mut FsmContext) {
    ctx.commands.tone = Some(ToneKind::Beep);
    let l1 = messages::user_line(ctx.session.user_id.as_str());
    ctx.commands.show(&l1, messages::PLEASE_WAIT_L2);
    ctx.commands.outbound = Some(Outbound::Identifier);
    ctx.session.awaiting_host_reply = true;
    ctx.timers
        .arm(TimerKind::UserTimeout, ctx.now_ms, ctx.config.user_timeout_ms);
}

fn authenticating_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.inputs.reply.take()? {
        HostReply::UserFound { name } => {
            info!("Authenticating: user {} found", ctx.session.user_id);
            ctx.session.user_name = name;
            Some(StateId::AwaitingObject)
        }
        HostReply::UserNotFound => {
            warn!("Authenticating: user {} not registered", ctx.session.user_id);
            ctx.session.outcome = Some(Outcome::UserNotFound);
            Some(StateId::Rejected)
        }
        HostReply::Rejected => {
            warn!("Authenticating: host refused user {}", ctx.session.user_id);
            ctx.session.outcome = Some(Outcome::UserRejected);
            Some(StateId::Rejected)
        }
        other => {
            debug!("Authenticating: ignoring {:?}", other);
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_OBJECT state
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_object_enter(ctx: &mut FsmContext) {
    let l1 = messages::user_line(ctx.session.who());
    ctx.commands.show(&l1, messages::INSERT_OBJECT_L2);
    ctx.session.awaiting_host_reply = false;
    ctx.timers
        .arm(TimerKind::UserTimeout, ctx.now_ms, ctx.config.user_timeout_ms);
}

fn awaiting_object_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(reply) = ctx.inputs.reply.take() {
        debug!("AwaitingObject: ignoring {:?}", reply);
    }

    let distance = ctx.inputs.distance_cm?;
    if distance < ctx.config.object_detect_distance_cm {
        info!("AwaitingObject: object at {:.1} cm", distance);
        return Some(StateId::Analyzing);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ANALYZING state
// ═══════════════════════════════════════════════════════════════════════════

fn analyzing_enter(ctx: &mut FsmContext) {
    ctx.commands.show(messages::ANALYZING_L1, messages::PLEASE_WAIT_L2);
    ctx.commands.outbound = Some(Outbound::ObjectDetected);
    ctx.session.awaiting_host_reply = true;
    ctx.timers
        .arm(TimerKind::UserTimeout, ctx.now_ms, ctx.config.user_timeout_ms);
}

fn analyzing_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.inputs.reply.take()? {
        HostReply::Accepted { points } => {
            ctx.session.points = points.unwrap_or(ctx.config.points_per_deposit);
            info!("Analyzing: object accepted, +{}", ctx.session.points);
            Some(StateId::Dispensing)
        }
        HostReply::Rejected => {
            warn!("Analyzing: object rejected");
            ctx.session.outcome = Some(Outcome::ObjectRejected);
            Some(StateId::Rejected)
        }
        other => {
            debug!("Analyzing: ignoring {:?}", other);
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DISPENSING state
// ═══════════════════════════════════════════════════════════════════════════

fn dispensing_enter(ctx: &mut FsmContext) {
    ctx.session.awaiting_host_reply = false;
    ctx.session.outcome = Some(Outcome::Completed);
    ctx.commands.gate_open = true;
    let l2 = messages::points_line(ctx.session.points);
    ctx.commands.show(messages::ACCEPTED_L1, &l2);
    ctx.commands.tone = Some(ToneKind::Success);
    ctx.timers
        .arm(TimerKind::GateOpen, ctx.now_ms, ctx.config.gate_open_ms);
}

fn dispensing_exit(ctx: &mut FsmContext) {
    ctx.commands.gate_open = false;
}

// ═══════════════════════════════════════════════════════════════════════════
//  REJECTED state
// ═══════════════════════════════════════════════════════════════════════════

fn rejected_enter(ctx: &mut FsmContext) {
    ctx.session.awaiting_host_reply = false;
    ctx.commands.gate_open = false;
    let l1 = match ctx.session.outcome {
        Some(Outcome::UserNotFound) => messages::USER_NOT_FOUND_L1,
        _ => messages::REJECTED_L1,
    };
    ctx.commands.show(l1, messages::TRY_AGAIN_L2);
    ctx.commands.tone = Some(ToneKind::Error);
    ctx.timers
        .arm(TimerKind::GateOpen, ctx.now_ms, ctx.config.rejected_display_ms);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Dispensing and Rejected only wait out their hold timer.
fn hold_update(ctx: &mut FsmContext) -> Option<StateId> {
    if let Some(reply) = ctx.inputs.reply.take() {
        debug!("{}: ignoring {:?}", ctx.session.state.name(), reply);
    }
    None
}

fn hold_expire(_ctx: &mut FsmContext, _kind: TimerKind) -> Option<StateId> {
    Some(StateId::Idle)
}

fn user_timeout_expire(ctx: &mut FsmContext, kind: TimerKind) -> Option<StateId> {
    warn!(
        "{}: {:?} expired for user {}",
        ctx.session.state.name(),
        kind,
        ctx.session.user_id
    );
    ctx.session.outcome = Some(Outcome::Timeout);
    Some(StateId::Idle)
}
