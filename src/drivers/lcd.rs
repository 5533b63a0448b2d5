//! 16x2 HD44780 character LCD behind a PCF8574 I2C backpack.
//!
//! The backpack maps its 8 outputs as P0 = RS, P1 = RW, P2 = EN,
//! P3 = backlight, P4..P7 = D4..D7, so every byte reaches the controller
//! as two 4-bit nibbles, each latched by an EN pulse.
//!
//! [`Lcd1602::show`] only records the wanted frame.  [`Lcd1602::service`]
//! pushes at most [`CELLS_PER_SERVICE`] changed characters per call, so a
//! full redraw is spread across control ticks instead of stalling one.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::error::{self, PeripheralError};
use crate::pins::{LCD_COLS, LCD_ROWS};

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// Characters written per `service` call.
pub const CELLS_PER_SERVICE: usize = 4;

type Frame = [[u8; LCD_COLS]; LCD_ROWS];

const BLANK: Frame = [[b' '; LCD_COLS]; LCD_ROWS];

pub struct Lcd1602<I2C: I2c, D: DelayNs> {
    i2c: I2C,
    delay: D,
    addr: u8,
    wanted: Frame,
    shown: Frame,
    /// Controller's DDRAM cursor, if known.
    cursor: Option<(usize, usize)>,
}

impl<I2C: I2c, D: DelayNs> Lcd1602<I2C, D> {
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            wanted: BLANK,
            shown: BLANK,
            cursor: None,
        }
    }

    /// Power-on sequence: force 8-bit mode three times, drop to 4-bit,
    /// then 2 lines, display on, increment, clear.
    pub fn init(&mut self) -> error::Result<()> {
        self.delay.delay_ms(50);
        for _ in 0..3 {
            self.pulse(0x30 | BACKLIGHT)?;
            self.delay.delay_ms(5);
        }
        self.pulse(0x20 | BACKLIGHT)?;
        self.delay.delay_ms(5);

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_ENTRY_INCREMENT)?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);

        self.shown = BLANK;
        self.cursor = Some((0, 0));
        info!("LCD1602 ready at 0x{:02X}", self.addr);
        Ok(())
    }

    /// Replace both lines.  Text is padded with spaces; characters outside
    /// printable ASCII are shown as `?`.
    pub fn show(&mut self, line1: &str, line2: &str) {
        for (row, text) in self.wanted.iter_mut().zip([line1, line2]) {
            *row = [b' '; LCD_COLS];
            for (cell, c) in row.iter_mut().zip(text.chars()) {
                *cell = if c.is_ascii() && !c.is_ascii_control() {
                    c as u8
                } else {
                    b'?'
                };
            }
        }
    }

    /// True when the panel matches the last `show`.
    pub fn is_synced(&self) -> bool {
        self.wanted == self.shown
    }

    /// Write up to [`CELLS_PER_SERVICE`] cells that differ from the panel.
    pub fn service(&mut self) -> Result<(), PeripheralError> {
        let mut budget = CELLS_PER_SERVICE;
        for row in 0..LCD_ROWS {
            for col in 0..LCD_COLS {
                if budget == 0 {
                    return Ok(());
                }
                let ch = self.wanted[row][col];
                if self.shown[row][col] == ch {
                    continue;
                }
                if self.cursor != Some((row, col)) {
                    self.command(CMD_SET_DDRAM | (ROW_OFFSETS[row] + col as u8))?;
                }
                self.data(ch)?;
                self.shown[row][col] = ch;
                self.cursor = (col + 1 < LCD_COLS).then_some((row, col + 1));
                budget -= 1;
            }
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), PeripheralError> {
        self.write_byte(cmd, 0)
    }

    fn data(&mut self, ch: u8) -> Result<(), PeripheralError> {
        self.write_byte(ch, RS)
    }

    fn write_byte(&mut self, byte: u8, rs: u8) -> Result<(), PeripheralError> {
        for nibble in [byte & 0xF0, (byte << 4) & 0xF0] {
            self.pulse(nibble | rs | BACKLIGHT)?;
        }
        self.delay.delay_us(50);
        Ok(())
    }

    /// Present `bits` and latch them with an EN high-low pulse.
    fn pulse(&mut self, bits: u8) -> Result<(), PeripheralError> {
        self.i2c
            .write(self.addr, &[bits | EN])
            .map_err(|_| PeripheralError::Bus)?;
        self.delay.delay_us(1);
        self.i2c
            .write(self.addr, &[bits & !EN])
            .map_err(|_| PeripheralError::Bus)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    use super::*;
    use crate::drivers::rfid::fake::NoDelay;
    use crate::error::Error;

    #[derive(Default)]
    struct Bus {
        bytes: Vec<u8>,
    }

    impl ErrorType for Bus {
        type Error = Infallible;
    }

    impl I2c for Bus {
        fn transaction(
            &mut self,
            _address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Infallible> {
            for op in operations {
                if let Operation::Write(bytes) = op {
                    self.bytes.extend_from_slice(bytes);
                }
            }
            Ok(())
        }
    }

    /// Backpack that never acknowledges its address.
    struct AbsentBus;

    impl ErrorType for AbsentBus {
        type Error = ErrorKind;
    }

    impl I2c for AbsentBus {
        fn transaction(
            &mut self,
            _address: u8,
            _operations: &mut [Operation<'_>],
        ) -> Result<(), ErrorKind> {
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        }
    }

    #[derive(Debug, PartialEq)]
    enum Op {
        Cmd(u8),
        Data(u8),
    }

    /// Rebuild controller operations from latched nibble pairs.
    fn decode(bytes: &[u8]) -> Vec<Op> {
        let latched: Vec<u8> = bytes.iter().copied().filter(|b| b & EN != 0).collect();
        latched
            .chunks(2)
            .map(|pair| {
                let byte = (pair[0] & 0xF0) | (pair[1] >> 4);
                if pair[0] & RS != 0 {
                    Op::Data(byte)
                } else {
                    Op::Cmd(byte)
                }
            })
            .collect()
    }

    fn lcd() -> Lcd1602<Bus, NoDelay> {
        let mut lcd = Lcd1602::new(Bus::default(), NoDelay, 0x27);
        lcd.init().unwrap();
        lcd.i2c.bytes.clear();
        lcd
    }

    #[test]
    fn init_ends_with_clear() {
        let mut lcd = Lcd1602::new(Bus::default(), NoDelay, 0x27);
        lcd.init().unwrap();
        // Skip the four single-nibble wake-up pulses.
        let ops = decode(&lcd.i2c.bytes[4 * 2..]);
        assert_eq!(
            ops,
            vec![
                Op::Cmd(CMD_FUNCTION_4BIT_2LINE),
                Op::Cmd(CMD_DISPLAY_ON),
                Op::Cmd(CMD_ENTRY_INCREMENT),
                Op::Cmd(CMD_CLEAR),
            ]
        );
        assert!(lcd.i2c.bytes.iter().all(|b| b & BACKLIGHT != 0));
    }

    #[test]
    fn missing_backpack_fails_init_as_peripheral_error() {
        let mut lcd = Lcd1602::new(AbsentBus, NoDelay, 0x27);
        assert_eq!(lcd.init(), Err(Error::Peripheral(PeripheralError::Bus)));
        assert_eq!(lcd.cursor, None);
    }

    #[test]
    fn show_is_deferred_until_service() {
        let mut lcd = lcd();
        lcd.show("Hi", "");
        assert!(lcd.i2c.bytes.is_empty());
        assert!(!lcd.is_synced());
        lcd.service().unwrap();
        assert_eq!(decode(&lcd.i2c.bytes), vec![Op::Data(b'H'), Op::Data(b'i')]);
        assert!(lcd.is_synced());
    }

    #[test]
    fn service_is_bounded_per_call() {
        let mut lcd = lcd();
        lcd.show("ABCDEFGHIJ", "");
        lcd.service().unwrap();
        let data = decode(&lcd.i2c.bytes)
            .into_iter()
            .filter(|op| matches!(op, Op::Data(_)))
            .count();
        assert_eq!(data, CELLS_PER_SERVICE);

        let mut calls = 1;
        while !lcd.is_synced() {
            lcd.service().unwrap();
            calls += 1;
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn only_changed_cells_are_rewritten() {
        let mut lcd = lcd();
        lcd.show("ABCD", "");
        lcd.service().unwrap();
        lcd.i2c.bytes.clear();

        lcd.show("ABXD", "");
        lcd.service().unwrap();
        assert_eq!(
            decode(&lcd.i2c.bytes),
            vec![Op::Cmd(CMD_SET_DDRAM | 2), Op::Data(b'X')]
        );
    }

    #[test]
    fn second_row_uses_its_ddram_offset() {
        let mut lcd = lcd();
        lcd.show("", "Z");
        lcd.service().unwrap();
        assert_eq!(
            decode(&lcd.i2c.bytes),
            vec![Op::Cmd(CMD_SET_DDRAM | 0x40), Op::Data(b'Z')]
        );
    }

    #[test]
    fn non_ascii_is_replaced() {
        let mut lcd = lcd();
        lcd.show("é", "");
        lcd.service().unwrap();
        assert_eq!(decode(&lcd.i2c.bytes), vec![Op::Data(b'?')]);
    }
}
