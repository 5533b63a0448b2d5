//! Session deadlines.
//!
//! Two named timers, each a single absolute expiry on the monotonic
//! millisecond clock.  "Waiting" in the state machine is nothing more than
//! a state plus an armed timer checked on later ticks.

/// The timers a session can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Per-phase deadline for the user or the host.
    UserTimeout,
    /// Gate-open hold, also used for the rejection screen hold.
    GateOpen,
}

/// At most one deadline of each kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    user_timeout: Option<u64>,
    gate_open: Option<u64>,
}

impl Timers {
    pub const fn new() -> Self {
        Self {
            user_timeout: None,
            gate_open: None,
        }
    }

    /// Arm (or re-arm) `kind` to expire `duration_ms` after `now_ms`.
    pub fn arm(&mut self, kind: TimerKind, now_ms: u64, duration_ms: u32) {
        *self.slot_mut(kind) = Some(now_ms.saturating_add(u64::from(duration_ms)));
    }

    pub fn disarm(&mut self, kind: TimerKind) {
        *self.slot_mut(kind) = None;
    }

    pub fn disarm_all(&mut self) {
        self.user_timeout = None;
        self.gate_open = None;
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadline(kind).is_some()
    }

    pub fn any_armed(&self) -> bool {
        self.user_timeout.is_some() || self.gate_open.is_some()
    }

    /// Absolute expiry of `kind`, if armed.
    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        match kind {
            TimerKind::UserTimeout => self.user_timeout,
            TimerKind::GateOpen => self.gate_open,
        }
    }

    /// The first armed timer whose deadline is at or before `now_ms`.
    /// The user timeout is reported ahead of the gate timer.
    pub fn expired(&self, now_ms: u64) -> Option<TimerKind> {
        [TimerKind::UserTimeout, TimerKind::GateOpen]
            .into_iter()
            .find(|&kind| self.deadline(kind).is_some_and(|at| now_ms >= at))
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Option<u64> {
        match kind {
            TimerKind::UserTimeout => &mut self.user_timeout,
            TimerKind::GateOpen => &mut self.gate_open,
        }
    }
}
