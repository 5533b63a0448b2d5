//! MFRC522 13.56 MHz card reader over SPI.
//!
//! Only what the kiosk needs: wake any tag in the field (`WUPA`), run one
//! cascade level of anticollision, and check the UID check byte.  The
//! 4-byte UID is rendered as uppercase hex and becomes the user
//! identifier sent to the host.
//!
//! A tag resting on the antenna answers every poll, so [`PresenceFilter`]
//! turns the raw read stream into one event per presentation.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use log::{debug, info};

use crate::error::{self, PeripheralError};
use crate::link::UserId;

// ── Registers ─────────────────────────────────────────────────

const COMMAND: u8 = 0x01;
const COM_IRQ: u8 = 0x04;
const ERROR: u8 = 0x06;
const FIFO_DATA: u8 = 0x09;
const FIFO_LEVEL: u8 = 0x0A;
const BIT_FRAMING: u8 = 0x0D;
const MODE: u8 = 0x11;
const TX_CONTROL: u8 = 0x14;
const TX_ASK: u8 = 0x15;
const T_MODE: u8 = 0x2A;
const T_PRESCALER: u8 = 0x2B;
const T_RELOAD_H: u8 = 0x2C;
const T_RELOAD_L: u8 = 0x2D;
const VERSION: u8 = 0x37;

// ── Commands ──────────────────────────────────────────────────

const CMD_IDLE: u8 = 0x00;
const CMD_TRANSCEIVE: u8 = 0x0C;
const CMD_SOFT_RESET: u8 = 0x0F;

const PICC_WUPA: u8 = 0x52;
const PICC_SEL_CL1: u8 = 0x93;

/// Upper bound on IRQ register polls per transceive.  The chip's own
/// timer fires after ~5 ms, well inside this.
const MAX_IRQ_POLLS: u16 = 300;

const IRQ_RX_OR_IDLE: u8 = 0x30;
const IRQ_TIMER: u8 = 0x01;
const ERR_COLLISION: u8 = 0x08;
const ERR_FATAL: u8 = 0x13;

pub struct Mfrc522<SPI: SpiDevice> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mfrc522<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Soft-reset the chip, configure the receive timeout, switch the
    /// antenna on.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> error::Result<()> {
        self.write(COMMAND, CMD_SOFT_RESET)?;
        delay.delay_ms(50);

        // TAuto, prescaler 0xA9 -> 40 kHz timer; reload 200 -> 5 ms window.
        self.write(T_MODE, 0x80)?;
        self.write(T_PRESCALER, 0xA9)?;
        self.write(T_RELOAD_H, 0x00)?;
        self.write(T_RELOAD_L, 0xC8)?;
        self.write(TX_ASK, 0x40)?;
        self.write(MODE, 0x3D)?;

        let tx = self.read(TX_CONTROL)?;
        if tx & 0x03 != 0x03 {
            self.write(TX_CONTROL, tx | 0x03)?;
        }

        info!("MFRC522 ready (version 0x{:02X})", self.read(VERSION)?);
        Ok(())
    }

    /// Read the UID of a tag in the field.
    ///
    /// [`PeripheralError::NoCard`] when nothing answered.
    pub fn read_uid(&mut self) -> Result<[u8; 4], PeripheralError> {
        let mut atqa = [0u8; 2];
        self.transceive(&[PICC_WUPA], 0x07, &mut atqa)?;

        let mut resp = [0u8; 5];
        let n = self.transceive(&[PICC_SEL_CL1, 0x20], 0x00, &mut resp)?;
        if n != resp.len() {
            return Err(PeripheralError::Bus);
        }
        let uid = [resp[0], resp[1], resp[2], resp[3]];
        if uid_check_byte(&uid) != resp[4] {
            return Err(PeripheralError::Checksum);
        }
        Ok(uid)
    }

    fn transceive(
        &mut self,
        data: &[u8],
        tx_last_bits: u8,
        out: &mut [u8],
    ) -> Result<usize, PeripheralError> {
        self.write(COMMAND, CMD_IDLE)?;
        self.write(COM_IRQ, 0x7F)?;
        self.write(FIFO_LEVEL, 0x80)?;
        for &b in data {
            self.write(FIFO_DATA, b)?;
        }
        self.write(BIT_FRAMING, tx_last_bits)?;
        self.write(COMMAND, CMD_TRANSCEIVE)?;
        self.set_bits(BIT_FRAMING, 0x80)?;

        let mut irq = 0;
        for _ in 0..MAX_IRQ_POLLS {
            irq = self.read(COM_IRQ)?;
            if irq & (IRQ_RX_OR_IDLE | IRQ_TIMER) != 0 {
                break;
            }
        }
        self.write(BIT_FRAMING, tx_last_bits)?;

        if irq & IRQ_RX_OR_IDLE == 0 {
            return Err(if irq & IRQ_TIMER != 0 {
                PeripheralError::NoCard
            } else {
                PeripheralError::Timeout
            });
        }

        let err = self.read(ERROR)?;
        if err & ERR_COLLISION != 0 {
            return Err(PeripheralError::Collision);
        }
        if err & ERR_FATAL != 0 {
            return Err(PeripheralError::Bus);
        }

        let n = usize::from(self.read(FIFO_LEVEL)?).min(out.len());
        for slot in out.iter_mut().take(n) {
            *slot = self.read(FIFO_DATA)?;
        }
        Ok(n)
    }

    fn set_bits(&mut self, reg: u8, mask: u8) -> Result<(), PeripheralError> {
        let v = self.read(reg)?;
        self.write(reg, v | mask)
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<(), PeripheralError> {
        self.spi
            .write(&[(reg << 1) & 0x7E, value])
            .map_err(|_| PeripheralError::Bus)
    }

    fn read(&mut self, reg: u8) -> Result<u8, PeripheralError> {
        let mut buf = [((reg << 1) & 0x7E) | 0x80, 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| PeripheralError::Bus)?;
        Ok(buf[1])
    }
}

/// XOR of the UID bytes, sent by the tag after the UID.
pub fn uid_check_byte(uid: &[u8]) -> u8 {
    uid.iter().fold(0, |acc, b| acc ^ b)
}

/// `[0xA1, 0xB2, ...]` → `"A1B2..."`.
pub fn uid_to_hex(uid: &[u8]) -> UserId {
    let mut out = UserId::new();
    for b in uid {
        // 4 bytes -> 8 chars; capacity is 20.
        let _ = write!(out, "{:02X}", b);
    }
    out
}

// ── Presence filter ───────────────────────────────────────────

/// Consecutive empty polls before the same tag may be reported again.
const REARM_MISSES: u8 = 2;

/// Reports each tag once per presentation.
#[derive(Debug, Default)]
pub struct PresenceFilter {
    last: Option<UserId>,
    misses: u8,
}

impl PresenceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw read; returns the identifier only when it is new.
    pub fn observe(&mut self, read: Option<UserId>) -> Option<UserId> {
        match read {
            Some(uid) => {
                self.misses = 0;
                if self.last.as_ref() == Some(&uid) {
                    return None;
                }
                self.last = Some(uid.clone());
                Some(uid)
            }
            None => {
                if self.last.is_some() {
                    self.misses += 1;
                    if self.misses >= REARM_MISSES {
                        self.last = None;
                        self.misses = 0;
                    }
                }
                None
            }
        }
    }
}

/// Chip + presence filter: the card reader as the kiosk sees it.
pub struct CardScanner<SPI: SpiDevice> {
    chip: Mfrc522<SPI>,
    filter: PresenceFilter,
}

impl<SPI: SpiDevice> CardScanner<SPI> {
    pub fn new(chip: Mfrc522<SPI>) -> Self {
        Self {
            chip,
            filter: PresenceFilter::new(),
        }
    }

    /// One bounded poll.  Read errors count as "no tag".
    pub fn poll(&mut self) -> Option<UserId> {
        let raw = match self.chip.read_uid() {
            Ok(uid) => Some(uid_to_hex(&uid)),
            Err(PeripheralError::NoCard) => None,
            Err(e) => {
                debug!("card read failed: {}", e);
                None
            }
        };
        self.filter.observe(raw)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeRc522, NoDelay};
    use super::*;

    fn uid(s: &str) -> UserId {
        let mut u = UserId::new();
        u.push_str(s).unwrap();
        u
    }

    #[test]
    fn init_resets_and_enables_antenna() {
        let mut chip = Mfrc522::new(FakeRc522::new());
        chip.init(&mut NoDelay).unwrap();
        let writes = &chip.spi.writes;
        assert_eq!(writes[0], (COMMAND, CMD_SOFT_RESET));
        assert!(writes.contains(&(T_RELOAD_L, 0xC8)));
        assert!(writes.contains(&(TX_CONTROL, 0x03)));
    }

    #[test]
    fn reads_uid_of_tag_in_field() {
        let mut fake = FakeRc522::new();
        fake.tag = Some([0xA1, 0xB2, 0x03, 0x4F]);
        let mut chip = Mfrc522::new(fake);
        assert_eq!(chip.read_uid(), Ok([0xA1, 0xB2, 0x03, 0x4F]));
    }

    #[test]
    fn empty_field_is_no_card() {
        let mut chip = Mfrc522::new(FakeRc522::new());
        assert_eq!(chip.read_uid(), Err(PeripheralError::NoCard));
    }

    #[test]
    fn bad_check_byte_is_rejected() {
        let mut fake = FakeRc522::new();
        fake.tag = Some([1, 2, 3, 4]);
        fake.corrupt_check_byte = true;
        let mut chip = Mfrc522::new(fake);
        assert_eq!(chip.read_uid(), Err(PeripheralError::Checksum));
    }

    #[test]
    fn uid_renders_as_uppercase_hex() {
        assert_eq!(uid_to_hex(&[0xA1, 0xB2, 0x03, 0x4F]).as_str(), "A1B2034F");
    }

    #[test]
    fn filter_reports_once_per_presentation() {
        let mut f = PresenceFilter::new();
        assert_eq!(f.observe(Some(uid("AA"))), Some(uid("AA")));
        assert_eq!(f.observe(Some(uid("AA"))), None);
        // A single dropout is not a removal.
        assert_eq!(f.observe(None), None);
        assert_eq!(f.observe(Some(uid("AA"))), None);
        // Two empty polls re-arm.
        f.observe(None);
        f.observe(None);
        assert_eq!(f.observe(Some(uid("AA"))), Some(uid("AA")));
    }

    #[test]
    fn filter_reports_a_different_tag_immediately() {
        let mut f = PresenceFilter::new();
        f.observe(Some(uid("AA")));
        assert_eq!(f.observe(Some(uid("BB"))), Some(uid("BB")));
    }

    #[test]
    fn scanner_reports_resting_tag_once() {
        let mut fake = FakeRc522::new();
        fake.tag = Some([0xDE, 0xAD, 0xBE, 0xEF]);
        let mut scanner = CardScanner::new(Mfrc522::new(fake));
        assert_eq!(scanner.poll(), Some(uid("DEADBEEF")));
        assert_eq!(scanner.poll(), None);
        assert_eq!(scanner.poll(), None);
    }
}
