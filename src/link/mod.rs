//! Host link — the line-oriented serial channel to the adjudicating host.
//!
//! ```text
//!   AppService ──HostPort──▶ HostLink ──codec──▶ Transport (UART)
//!        ▲                      │
//!        └──── HostReply ◀──────┘  (one decoded line per poll)
//! ```
//!
//! The device speaks first (`RFID:<id>`, `OBJ_DETECTED`); the host answers
//! with one reply line per event.  The link itself is stateless with
//! respect to sessions: it neither knows nor cares which reply the state
//! machine is waiting for.

pub mod codec;
pub mod host;
pub mod transport;

use crate::messages::DisplayLine;

/// Card identifier as read from the tag (uppercase hex UID).
pub type UserId = heapless::String<20>;

/// Events the device reports to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent<'a> {
    /// A card was presented (`RFID:<id>`).
    Identifier(&'a str),
    /// The proximity sensor confirmed a deposited object (`OBJ_DETECTED`).
    ObjectDetected,
}

/// A decoded host adjudication.  Consumed once by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostReply {
    /// The identifier belongs to a registered user.  `READY` carries no
    /// name; `USER:OK:<name>` carries the display name.
    UserFound { name: Option<DisplayLine> },
    /// The identifier is not registered.
    UserNotFound,
    /// The deposited object was accepted, optionally with the points awarded.
    Accepted { points: Option<u16> },
    /// The object (or the user) was rejected.
    Rejected,
}
