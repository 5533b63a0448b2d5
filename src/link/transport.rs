//! Transport abstraction — any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART1 towards the host PC ([`crate::adapters::uart`], ESP-IDF only)
//! - [`MemoryTransport`] for host-side tests and simulation
//!
//! [`HostLink`](super::host::HostLink) is generic over `Transport`, so
//! swapping the physical channel requires zero changes to the codec.

use std::collections::VecDeque;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// In-memory transport: bytes injected with [`inject`](Self::inject) are
/// returned by `read`; everything written is captured for inspection.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    /// Maximum bytes handed out per `read`, to exercise partial lines.
    read_chunk: Option<usize>,
    fail_writes: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit every `read` to at most `n` bytes.
    pub fn with_read_chunk(mut self, n: usize) -> Self {
        self.read_chunk = Some(n.max(1));
        self
    }

    /// Queue bytes as if the host had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Make every subsequent `write` fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Everything written so far, split into lines (newline stripped).
    pub fn sent_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.tx)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Bytes still waiting to be read.
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }
}

impl Transport for MemoryTransport {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let limit = self.read_chunk.unwrap_or(buf.len()).min(buf.len());
        let mut n = 0;
        while n < limit {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        if self.fail_writes {
            return Err(());
        }
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}
