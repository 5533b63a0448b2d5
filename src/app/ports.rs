//! Port traits — the hexagonal boundary between session logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (card reader, proximity sensor, gate, feedback, display,
//! host link, event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! ## Contract
//!
//! Every method returns promptly.  Ports poll, they never wait; a driver
//! that needs longer than a tick spreads the work over `service` calls.

use crate::error::LinkError;
use crate::link::{HostReply, UserId};

// ───────────────────────────────────────────────────────────────
// Input ports (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// RFID reader.
pub trait CardReader {
    /// Identifier of a newly presented tag, at most once per presentation.
    /// A tag left resting on the reader is not reported again.
    fn try_read(&mut self) -> Option<UserId>;
}

/// Ultrasonic distance sensor.
pub trait ProximitySensor {
    /// Current distance in centimetres.  Failed measurements are reported
    /// as a non-finite value; the core decides what is plausible.
    fn distance_cm(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Output ports (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Deposit gate servo.  Both calls are idempotent: repeating the current
/// position causes no further actuation.
pub trait Gate {
    fn open(&mut self);
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// LEDs + buzzer.  Fire-and-forget.
pub trait Feedback {
    fn success_tone(&mut self);
    fn error_tone(&mut self);
    fn beep(&mut self);

    /// Bounded background work (ending a tone once its duration passed).
    fn service(&mut self, _now_ms: u64) {}
}

/// Two-line character display.
pub trait Display {
    /// Replace both lines.  From the caller's view the swap is atomic.
    fn show(&mut self, line1: &str, line2: &str);

    /// Bounded background work (pushing the frame to the panel).
    fn service(&mut self) {}
}

/// Everything the session core drives in one bundle.
///
/// Blanket-implemented; one hardware adapter (or one mock) satisfies all
/// five peripheral ports without double mutable borrows.
pub trait Peripherals: CardReader + ProximitySensor + Gate + Feedback + Display {}

impl<T: CardReader + ProximitySensor + Gate + Feedback + Display> Peripherals for T {}

// ───────────────────────────────────────────────────────────────
// Host port (domain ↔ adjudicating host)
// ───────────────────────────────────────────────────────────────

/// Message channel to the host.
pub trait HostPort {
    /// Report a presented card.
    fn send_identifier(&mut self, id: &str) -> Result<(), LinkError>;

    /// Report a deposited object.
    fn send_object_detected(&mut self) -> Result<(), LinkError>;

    /// At most one decoded reply; `Ok(None)` when nothing complete arrived.
    fn poll_reply(&mut self) -> Result<Option<HostReply>, LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
