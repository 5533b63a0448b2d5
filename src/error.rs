//! Unified error types for the Eco-RVM firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! bootstrap path's error handling uniform.  All variants are `Copy` so
//! they pass through the control loop without allocation.  None of them
//! is fatal to the session state machine: peripheral errors become "no
//! event this tick" and link errors are left to the timeout path.

use core::fmt;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A peripheral could not be driven or returned unusable data.
    Peripheral(PeripheralError),
    /// The host serial link failed.
    Link(LinkError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peripheral(e) => write!(f, "peripheral: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Peripheral errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralError {
    /// SPI / I2C / GPIO / PWM transfer failed.
    Bus,
    /// The device did not answer within its bounded window.
    Timeout,
    /// No card in the reader field.
    NoCard,
    /// More than one card answered the anticollision loop.
    Collision,
    /// UID check byte did not match.
    Checksum,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for PeripheralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus transfer failed"),
            Self::Timeout => write!(f, "device timeout"),
            Self::NoCard => write!(f, "no card"),
            Self::Collision => write!(f, "card collision"),
            Self::Checksum => write!(f, "UID checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl core::error::Error for PeripheralError {}

impl From<PeripheralError> for Error {
    fn from(e: PeripheralError) -> Self {
        Self::Peripheral(e)
    }
}

// ---------------------------------------------------------------------------
// Host link errors
// ---------------------------------------------------------------------------

/// Inbound line could not be turned into a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Line exceeded the receive buffer; dropped up to the next newline.
    LineTooLong,
    /// Line is not valid UTF-8.
    InvalidUtf8,
    /// Line does not match any reply in the grammar.
    UnknownCommand,
    /// `ACCEPTED:<n>` with a non-numeric or oversized `<n>`.
    InvalidPoints,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineTooLong => write!(f, "line too long"),
            Self::InvalidUtf8 => write!(f, "invalid UTF-8"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::InvalidPoints => write!(f, "invalid point value"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Outbound event could not be serialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// Identifier is empty or contains characters that break the line grammar.
    InvalidIdentifier,
    /// Encoded line does not fit the transmit buffer.
    BufferFull,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentifier => write!(f, "invalid identifier"),
            Self::BufferFull => write!(f, "transmit buffer full"),
        }
    }
}

impl core::error::Error for EncodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The underlying byte transport reported an error or stalled.
    Transport,
    Decode(DecodeError),
    Encode(EncodeError),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport failure"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Encode(e) => write!(f, "encode: {e}"),
        }
    }
}

impl core::error::Error for LinkError {}

impl From<DecodeError> for LinkError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<EncodeError> for LinkError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
