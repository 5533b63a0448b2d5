//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: this tick's inputs, the command outputs, the live session,
//! its timers, and the configuration.  Only the state machine touches it;
//! drivers see nothing but the commands applied through the ports.

use crate::config::SystemConfig;
use crate::link::{HostReply, UserId};
use crate::messages::{self, DisplayLine};

use super::StateId;
use super::timer::Timers;

// ---------------------------------------------------------------------------
// Inputs (written by AppService before the FSM tick)
// ---------------------------------------------------------------------------

/// What arrived this tick.  Cleared before every tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// A newly presented card (only polled in `Idle`).
    pub card: Option<UserId>,
    /// A plausible distance reading (only polled in `AwaitingObject`).
    pub distance_cm: Option<f32>,
    /// One decoded host reply.
    pub reply: Option<HostReply>,
}

// ---------------------------------------------------------------------------
// Commands (written by state handlers; applied by AppService)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneKind {
    Success,
    Error,
    Beep,
}

/// Both display lines, replaced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub line1: DisplayLine,
    pub line2: DisplayLine,
}

impl DisplayFrame {
    pub fn new(line1: &str, line2: &str) -> Self {
        Self {
            line1: messages::line(line1),
            line2: messages::line(line2),
        }
    }
}

/// Host messages a handler can request.  The identifier is taken from the
/// session when the command is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    Identifier,
    ObjectDetected,
}

/// Commands that state handlers write to request actions.
/// `gate_open` is a level applied every tick; the rest are one-shot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Commands {
    pub gate_open: bool,
    pub display: Option<DisplayFrame>,
    pub tone: Option<ToneKind>,
    pub outbound: Option<Outbound>,
}

impl Commands {
    pub fn show(&mut self, line1: &str, line2: &str) {
        self.display = Some(DisplayFrame::new(line1, line2));
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Object accepted and gate cycled.
    Completed,
    /// A phase deadline passed.
    Timeout,
    /// Host does not know the card.
    UserNotFound,
    /// Host refused the user.
    UserRejected,
    /// Host refused the object.
    ObjectRejected,
}

/// The one live user interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Empty when no card is being served.
    pub user_id: UserId,
    /// Display name supplied by the host, if any.
    pub user_name: Option<DisplayLine>,
    pub state: StateId,
    pub state_entered_at_ms: u64,
    pub awaiting_host_reply: bool,
    pub outcome: Option<Outcome>,
    /// Points awarded by an accepted deposit.
    pub points: u16,
}

impl Session {
    pub fn new() -> Self {
        Self {
            user_id: UserId::new(),
            user_name: None,
            state: StateId::Idle,
            state_entered_at_ms: 0,
            awaiting_host_reply: false,
            outcome: None,
            points: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.user_id.is_empty()
    }

    /// Clear all per-user fields.  State bookkeeping is kept.
    pub fn clear(&mut self) {
        self.user_id.clear();
        self.user_name = None;
        self.awaiting_host_reply = false;
        self.outcome = None;
        self.points = 0;
    }

    /// Name for greeting screens: the host-supplied name, else the card id.
    pub fn who(&self) -> &str {
        self.user_name
            .as_ref()
            .map_or(self.user_id.as_str(), |n| n.as_str())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Left behind by `Idle` entry when a session is torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub user_id: UserId,
    pub outcome: Outcome,
    pub points: u16,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic milliseconds for the current tick.
    pub now_ms: u64,

    // -- Inputs --
    pub inputs: InputSnapshot,

    // -- Outputs --
    pub commands: Commands,

    // -- Session --
    pub session: Session,
    pub timers: Timers,
    /// Set when a session ends; collected by the service after the tick.
    pub finished: Option<SessionSummary>,
    /// A timeout notice is on screen and the welcome screen is due back.
    pub notice_pending: bool,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            inputs: InputSnapshot::default(),
            commands: Commands::default(),
            session: Session::new(),
            timers: Timers::new(),
            finished: None,
            notice_pending: false,
            config,
        }
    }

    /// Milliseconds elapsed since the current state was entered.
    pub fn ms_in_state(&self) -> u64 {
        self.now_ms.saturating_sub(self.session.state_entered_at_ms)
    }
}
