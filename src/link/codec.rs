//! Newline-delimited text codec for the host link.
//!
//! Wire format (one event or reply per line, `\n` terminated; an optional
//! `\r` before the newline is ignored):
//! ```text
//!   device → host          host → device
//!   RFID:<id>              READY | USER:OK:<name> | USER:NEW | USER:ERROR
//!   OBJ_DETECTED           ACCEPTED | ACCEPTED:<points> | REJECTED
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines.  This
//! handles partial reads gracefully — a single `Transport::read` may return
//! part of a line, a whole line, or several lines concatenated.

use core::fmt::Write;

use crate::error::{DecodeError, EncodeError};
use crate::messages;

use super::{HostEvent, HostReply};

/// Longest line the decoder buffers (protects against a runaway sender).
pub const MAX_LINE_LEN: usize = 64;

pub const RFID_PREFIX: &str = "RFID:";
pub const OBJECT_DETECTED: &str = "OBJ_DETECTED";
pub const READY: &str = "READY";
pub const ACCEPTED: &str = "ACCEPTED";
pub const REJECTED: &str = "REJECTED";
pub const USER_OK_PREFIX: &str = "USER:OK:";
pub const USER_NEW: &str = "USER:NEW";
pub const USER_ERROR: &str = "USER:ERROR";

/// An encoded outbound line, newline included.
pub type EncodedLine = heapless::String<MAX_LINE_LEN>;

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Streaming line decoder.
pub struct LineDecoder {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    /// Current line overflowed; drop bytes until the next newline.
    overflowed: bool,
    /// `buf` holds a line already handed out; clear it on the next byte.
    yielded: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
            yielded: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some(Ok(line))` when a complete, non-empty line is available
    /// (trimmed; valid until the next call), `Some(Err(_))` when a line was
    /// dropped, and `None` while a line is still being assembled.
    pub fn push(&mut self, byte: u8) -> Option<Result<&str, DecodeError>> {
        if self.yielded {
            self.buf.clear();
            self.yielded = false;
        }

        match byte {
            b'\n' => {
                if self.overflowed {
                    self.overflowed = false;
                    self.buf.clear();
                    return Some(Err(DecodeError::LineTooLong));
                }
                let blank = match core::str::from_utf8(&self.buf) {
                    Ok(text) => text.trim().is_empty(),
                    Err(_) => {
                        self.buf.clear();
                        return Some(Err(DecodeError::InvalidUtf8));
                    }
                };
                if blank {
                    self.buf.clear();
                    return None;
                }
                self.yielded = true;
                Some(Ok(core::str::from_utf8(&self.buf).map_or("", str::trim)))
            }
            b'\r' => None,
            _ if self.overflowed => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Drop any partial line (e.g. after the transport reconnects).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
        self.yielded = false;
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Reply grammar
// ---------------------------------------------------------------------------

/// Parse one trimmed inbound line.
pub fn parse_reply(line: &str) -> Result<HostReply, DecodeError> {
    match line {
        READY => return Ok(HostReply::UserFound { name: None }),
        ACCEPTED => return Ok(HostReply::Accepted { points: None }),
        REJECTED => return Ok(HostReply::Rejected),
        USER_NEW | USER_ERROR => return Ok(HostReply::UserNotFound),
        _ => {}
    }

    if let Some(points) = line.strip_prefix(ACCEPTED).and_then(|r| r.strip_prefix(':')) {
        let points = points
            .parse::<u16>()
            .map_err(|_| DecodeError::InvalidPoints)?;
        return Ok(HostReply::Accepted {
            points: Some(points),
        });
    }

    if let Some(name) = line.strip_prefix(USER_OK_PREFIX) {
        let name = name.trim();
        return Ok(HostReply::UserFound {
            name: (!name.is_empty()).then(|| messages::line(name)),
        });
    }

    Err(DecodeError::UnknownCommand)
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Serialise an outbound event into a newline-terminated line.
pub fn encode_event(event: &HostEvent<'_>) -> Result<EncodedLine, EncodeError> {
    let mut out = EncodedLine::new();
    match event {
        HostEvent::Identifier(id) => {
            if !is_valid_identifier(id) {
                return Err(EncodeError::InvalidIdentifier);
            }
            writeln!(out, "{}{}", RFID_PREFIX, id).map_err(|_| EncodeError::BufferFull)?;
        }
        HostEvent::ObjectDetected => {
            writeln!(out, "{}", OBJECT_DETECTED).map_err(|_| EncodeError::BufferFull)?;
        }
    }
    Ok(out)
}

/// Identifiers are non-empty printable ASCII without the field separator.
fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_graphic() && b != b':')
}
