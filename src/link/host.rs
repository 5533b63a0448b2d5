//! `HostLink` — codec + transport, exposed to the core as a [`HostPort`].
//!
//! Every call is bounded: a send writes one short line, and a poll performs
//! at most one transport read and yields at most one reply.  Bytes left
//! over after a reply stay buffered for the next poll.

use log::{debug, warn};

use crate::app::ports::HostPort;
use crate::error::LinkError;

use super::codec::{LineDecoder, encode_event, parse_reply};
use super::transport::Transport;
use super::{HostEvent, HostReply};

/// Bytes pulled from the transport per poll.
const RX_CHUNK: usize = 32;

pub struct HostLink<T: Transport> {
    transport: T,
    decoder: LineDecoder,
    rx: [u8; RX_CHUNK],
    rx_len: usize,
    rx_pos: usize,
}

impl<T: Transport> HostLink<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
            rx: [0; RX_CHUNK],
            rx_len: 0,
            rx_pos: 0,
        }
    }

    /// Access the underlying transport (tests inject and inspect bytes here).
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Emit `RFID:<id>`.
    pub fn send_identifier(&mut self, id: &str) -> Result<(), LinkError> {
        self.send(&HostEvent::Identifier(id))
    }

    /// Emit `OBJ_DETECTED`.
    pub fn send_object_detected(&mut self) -> Result<(), LinkError> {
        self.send(&HostEvent::ObjectDetected)
    }

    /// Return at most one decoded reply; never blocks.
    ///
    /// Partial lines stay buffered.  A line that fails to decode is
    /// consumed and reported as [`LinkError::Decode`].
    pub fn poll_reply(&mut self) -> Result<Option<HostReply>, LinkError> {
        if self.rx_pos == self.rx_len {
            self.rx_pos = 0;
            self.rx_len = 0;
            let n = self.transport.read(&mut self.rx).map_err(|e| {
                warn!("host link read failed: {:?}", e);
                LinkError::Transport
            })?;
            self.rx_len = n.min(RX_CHUNK);
        }

        while self.rx_pos < self.rx_len {
            let byte = self.rx[self.rx_pos];
            self.rx_pos += 1;
            match self.decoder.push(byte) {
                None => {}
                Some(Ok(line)) => {
                    debug!("host -> {}", line);
                    return parse_reply(line).map(Some).map_err(LinkError::from);
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }

        Ok(None)
    }

    fn send(&mut self, event: &HostEvent<'_>) -> Result<(), LinkError> {
        let line = encode_event(event)?;
        let mut remaining = line.as_bytes();
        while !remaining.is_empty() {
            let n = self.transport.write(remaining).map_err(|e| {
                warn!("host link write failed: {:?}", e);
                LinkError::Transport
            })?;
            if n == 0 {
                return Err(LinkError::Transport);
            }
            remaining = &remaining[n.min(remaining.len())..];
        }
        self.transport.flush().map_err(|e| {
            warn!("host link flush failed: {:?}", e);
            LinkError::Transport
        })?;
        debug!("host <- {}", line.trim_end());
        Ok(())
    }
}

impl<T: Transport> HostPort for HostLink<T> {
    fn send_identifier(&mut self, id: &str) -> Result<(), LinkError> {
        HostLink::send_identifier(self, id)
    }

    fn send_object_detected(&mut self) -> Result<(), LinkError> {
        HostLink::send_object_detected(self)
    }

    fn poll_reply(&mut self) -> Result<Option<HostReply>, LinkError> {
        HostLink::poll_reply(self)
    }
}
