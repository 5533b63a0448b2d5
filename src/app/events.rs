//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, forward to a
//! maintenance console, etc.

use serde::Serialize;

use crate::error::LinkError;
use crate::fsm::StateId;
use crate::fsm::context::SessionSummary;
use crate::link::UserId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// A card opened a session.
    SessionStarted { user_id: UserId },

    /// The session was torn down on return to Idle.
    SessionEnded(SessionSummary),

    /// An inbound line was dropped (undecodable, oversized, unknown).
    LinkFault(LinkError),

    /// An outbound message could not be sent; the phase timer will recover.
    HostSendFailed(LinkError),

    /// Periodic status snapshot.
    Status(StatusReport),
}

/// Point-in-time status of the kiosk, suitable for logging as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: &'static str,
    pub uptime_ms: u64,
    /// Control-loop passes since start.
    pub ticks: u64,
    pub session_active: bool,
    pub gate_open: bool,
    pub sessions: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub not_found: u32,
    pub timeouts: u32,
    pub link_faults: u32,
    pub points_awarded: u32,
}
