//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM and the shared context.  It exposes a
//! clean, hardware-agnostic API.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  Peripherals ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │      AppService         │
//!  HostPort   ◀──▶ │  FSM · Timers · Session │
//!                  └────────────────────────┘
//! ```
//!
//! One call to [`AppService::tick`] is one pass of the cooperative loop:
//! timers are checked first, then the peripheral owned by the current
//! state is sampled, one host reply is drained, the FSM advances at most
//! one state, and the resulting commands are applied.

use log::{debug, info, warn};

use crate::config::{ConfigError, SystemConfig};
use crate::fsm::context::{FsmContext, Outbound, Outcome, Session, SessionSummary, ToneKind};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, Poll, StateId};

use super::events::{AppEvent, StatusReport};
use super::ports::{Display, EventSink, Feedback, Gate, HostPort, Peripherals};

// ───────────────────────────────────────────────────────────────
// Counters
// ───────────────────────────────────────────────────────────────

/// Lifetime counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub sessions: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub not_found: u32,
    pub timeouts: u32,
    pub link_faults: u32,
    pub points_awarded: u32,
}

impl SessionStats {
    /// Count a finished session.  Counters stick at their maximum.
    pub fn record(&mut self, summary: &SessionSummary) {
        let counter = match summary.outcome {
            Outcome::Completed => {
                self.points_awarded = self
                    .points_awarded
                    .saturating_add(u32::from(summary.points));
                &mut self.accepted
            }
            Outcome::Timeout => &mut self.timeouts,
            Outcome::UserNotFound => &mut self.not_found,
            Outcome::UserRejected | Outcome::ObjectRejected => &mut self.rejected,
        };
        *counter = counter.saturating_add(1);
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all session logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    stats: SessionStats,
    tick_count: u64,
    last_card_poll_ms: Option<u64>,
    last_proximity_poll_ms: Option<u64>,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Ok(Self {
            fsm,
            ctx,
            stats: SessionStats::default(),
            tick_count: 0,
            last_card_poll_ms: None,
            last_proximity_poll_ms: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter Idle: gate closed, welcome screen, no timers.
    pub fn start(&mut self, now_ms: u64, hw: &mut impl Peripherals, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        self.apply_peripheral_commands(hw);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one pass of the control loop at monotonic time `now_ms`.
    ///
    /// Bounded: at most one peripheral sample, one host read, one state
    /// transition, and one outbound message per call.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl Peripherals,
        host: &mut impl HostPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.ctx.now_ms = now_ms;
        self.ctx.inputs = Default::default();
        let prev_state = self.fsm.current_state();

        // 1. A due timer wins over anything that arrived this tick.
        let timer_due = self.ctx.timers.expired(now_ms).is_some();

        // 2. Sample the peripheral the current state owns
        if !timer_due {
            self.poll_peripheral(hw);
        }

        // 3. Drain one host reply
        self.drain_host(host, timer_due, sink);

        // 4. FSM tick (pure state logic)
        self.fsm.tick(&mut self.ctx);

        // 5. Apply commands via the ports
        self.apply_peripheral_commands(hw);
        self.apply_outbound(host, sink);
        Feedback::service(hw, now_ms);
        Display::service(hw);

        // 6. Report what changed
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
            if prev_state == StateId::Idle && self.ctx.session.is_active() {
                self.stats.sessions = self.stats.sessions.saturating_add(1);
                sink.emit(&AppEvent::SessionStarted {
                    user_id: self.ctx.session.user_id.clone(),
                });
            }
        }
        if let Some(summary) = self.ctx.finished.take() {
            self.stats.record(&summary);
            info!(
                "Session for {} ended: {:?}",
                summary.user_id, summary.outcome
            );
            sink.emit(&AppEvent::SessionEnded(summary));
        }
    }

    /// Emit a [`StatusReport`] through the sink.
    pub fn report_status(&self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Status(self.build_status()));
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from the current context.
    pub fn build_status(&self) -> StatusReport {
        StatusReport {
            state: self.fsm.current_state().name(),
            uptime_ms: self.ctx.now_ms,
            ticks: self.tick_count,
            session_active: self.ctx.session.is_active(),
            gate_open: self.ctx.commands.gate_open,
            sessions: self.stats.sessions,
            accepted: self.stats.accepted,
            rejected: self.stats.rejected,
            not_found: self.stats.not_found,
            timeouts: self.stats.timeouts,
            link_faults: self.stats.link_faults,
            points_awarded: self.stats.points_awarded,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// The live session (empty identifier in Idle).
    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    /// Whether any session timer is armed.
    pub fn timers_armed(&self) -> bool {
        self.ctx.timers.any_armed()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn poll_peripheral(&mut self, hw: &mut impl Peripherals) {
        let now = self.ctx.now_ms;
        match self.fsm.current_polls() {
            Poll::Nothing => {}
            Poll::CardReader => {
                let interval = u64::from(self.ctx.config.rfid_poll_interval_ms);
                if !due(self.last_card_poll_ms, now, interval) {
                    return;
                }
                self.last_card_poll_ms = Some(now);
                self.ctx.inputs.card = hw.try_read();
            }
            Poll::Proximity => {
                let interval = u64::from(self.ctx.config.proximity_poll_interval_ms);
                if !due(self.last_proximity_poll_ms, now, interval) {
                    return;
                }
                self.last_proximity_poll_ms = Some(now);
                let d = hw.distance_cm();
                if d.is_finite()
                    && d >= self.ctx.config.sensor_min_distance_cm
                    && d <= self.ctx.config.sensor_max_distance_cm
                {
                    self.ctx.inputs.distance_cm = Some(d);
                } else {
                    debug!("Discarding implausible distance {}", d);
                }
            }
        }
    }

    fn drain_host(&mut self, host: &mut impl HostPort, timer_due: bool, sink: &mut impl EventSink) {
        match host.poll_reply() {
            Ok(None) => {}
            Ok(Some(reply)) if timer_due => {
                info!("Discarding {:?}: phase timer already expired", reply);
            }
            Ok(Some(reply)) if !self.ctx.session.awaiting_host_reply => {
                warn!(
                    "Unexpected {:?} in {}",
                    reply,
                    self.fsm.current_state().name()
                );
            }
            Ok(Some(reply)) => self.ctx.inputs.reply = Some(reply),
            Err(e) => {
                self.stats.link_faults = self.stats.link_faults.saturating_add(1);
                warn!("Host link fault: {}", e);
                sink.emit(&AppEvent::LinkFault(e));
            }
        }
    }

    /// Translate FSM commands into peripheral port calls.
    fn apply_peripheral_commands(&mut self, hw: &mut impl Peripherals) {
        let cmds = &mut self.ctx.commands;

        // Gate is a level: re-asserted every tick, idempotent in the driver.
        if cmds.gate_open {
            Gate::open(hw);
        } else {
            Gate::close(hw);
        }

        if let Some(frame) = cmds.display.take() {
            hw.show(&frame.line1, &frame.line2);
        }

        match cmds.tone.take() {
            Some(ToneKind::Success) => hw.success_tone(),
            Some(ToneKind::Error) => hw.error_tone(),
            Some(ToneKind::Beep) => hw.beep(),
            None => {}
        }
    }

    fn apply_outbound(&mut self, host: &mut impl HostPort, sink: &mut impl EventSink) {
        let Some(outbound) = self.ctx.commands.outbound.take() else {
            return;
        };
        let result = match outbound {
            Outbound::Identifier => host.send_identifier(&self.ctx.session.user_id),
            Outbound::ObjectDetected => host.send_object_detected(),
        };
        if let Err(e) = result {
            warn!("Failed to send {:?}: {}", outbound, e);
            sink.emit(&AppEvent::HostSendFailed(e));
        }
    }
}

fn due(last: Option<u64>, now: u64, interval: u64) -> bool {
    last.is_none_or(|t| now.saturating_sub(t) >= interval)
}
