//! UART transport towards the host PC (ESP-IDF only).
//!
//! Wraps an `esp-idf-hal` [`UartDriver`] as a [`Transport`].  Reads never
//! wait: they return whatever the driver's RX ring already holds.

use esp_idf_hal::delay::{NON_BLOCK, TickType};
use esp_idf_hal::uart::UartDriver;
use esp_idf_svc::sys::EspError;

use crate::link::transport::Transport;

/// Longest time `flush` waits for the TX FIFO to drain (ms).
const TX_DRAIN_MS: u64 = 50;

pub struct UartTransport<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartTransport<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EspError> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
        self.uart.write(data)
    }

    fn flush(&mut self) -> Result<(), EspError> {
        self.uart
            .wait_tx_done(TickType::new_millis(TX_DRAIN_MS).ticks())
    }
}
