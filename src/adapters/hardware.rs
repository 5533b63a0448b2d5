//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Each driver gets its port implementation here, and [`KioskHardware`]
//! bundles one of each so the service sees a single [`Peripherals`]
//! value.  Driver errors stop at this boundary: they are logged and turn
//! into "no event" (inputs) or a skipped actuation (outputs).
//!
//! [`Peripherals`]: crate::app::ports::Peripherals

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal::spi::SpiDevice;
use log::warn;

use crate::app::ports::{CardReader, Display, Feedback, Gate, ProximitySensor};
use crate::drivers::feedback::{FeedbackDriver, TonePwm};
use crate::drivers::lcd::Lcd1602;
use crate::drivers::rfid::CardScanner;
use crate::drivers::servo_gate::{GatePosition, ServoGate};
use crate::drivers::ultrasonic::Ultrasonic;
use crate::error::PeripheralError;
use crate::link::UserId;

fn log_err(what: &str, result: Result<(), PeripheralError>) {
    if let Err(e) = result {
        warn!("{}: {}", what, e);
    }
}

// ── Driver → port implementations ─────────────────────────────

impl<SPI: SpiDevice> CardReader for CardScanner<SPI> {
    fn try_read(&mut self) -> Option<UserId> {
        self.poll()
    }
}

impl<TRIG: OutputPin, ECHO: InputPin, D: DelayNs> ProximitySensor for Ultrasonic<TRIG, ECHO, D> {
    fn distance_cm(&mut self) -> f32 {
        self.measure_cm()
    }
}

impl<P: SetDutyCycle> Gate for ServoGate<P> {
    fn open(&mut self) {
        log_err("gate open", ServoGate::open(self));
    }

    fn close(&mut self) {
        log_err("gate close", ServoGate::close(self));
    }

    fn is_open(&self) -> bool {
        self.position() == Some(GatePosition::Open)
    }
}

impl<B: TonePwm, G: OutputPin, R: OutputPin> Feedback for FeedbackDriver<B, G, R> {
    fn success_tone(&mut self) {
        log_err("success tone", self.success());
    }

    fn error_tone(&mut self) {
        log_err("error tone", self.error());
    }

    fn beep(&mut self) {
        log_err("beep", FeedbackDriver::beep(self));
    }

    fn service(&mut self, now_ms: u64) {
        log_err("feedback", FeedbackDriver::service(self, now_ms));
    }
}

impl<I2C: I2c, D: DelayNs> Display for Lcd1602<I2C, D> {
    fn show(&mut self, line1: &str, line2: &str) {
        Lcd1602::show(self, line1, line2);
    }

    fn service(&mut self) {
        log_err("lcd", Lcd1602::service(self));
    }
}

// ── Bundle ────────────────────────────────────────────────────

/// Concrete adapter that combines all kiosk hardware behind port traits.
pub struct KioskHardware<C, S, G, F, D> {
    pub reader: C,
    pub proximity: S,
    pub gate: G,
    pub feedback: F,
    pub display: D,
}

impl<C, S, G, F, D> KioskHardware<C, S, G, F, D> {
    pub fn new(reader: C, proximity: S, gate: G, feedback: F, display: D) -> Self {
        Self {
            reader,
            proximity,
            gate,
            feedback,
            display,
        }
    }
}

impl<C: CardReader, S, G, F, D> CardReader for KioskHardware<C, S, G, F, D> {
    fn try_read(&mut self) -> Option<UserId> {
        self.reader.try_read()
    }
}

impl<C, S: ProximitySensor, G, F, D> ProximitySensor for KioskHardware<C, S, G, F, D> {
    fn distance_cm(&mut self) -> f32 {
        self.proximity.distance_cm()
    }
}

impl<C, S, G: Gate, F, D> Gate for KioskHardware<C, S, G, F, D> {
    fn open(&mut self) {
        self.gate.open();
    }

    fn close(&mut self) {
        self.gate.close();
    }

    fn is_open(&self) -> bool {
        self.gate.is_open()
    }
}

impl<C, S, G, F: Feedback, D> Feedback for KioskHardware<C, S, G, F, D> {
    fn success_tone(&mut self) {
        self.feedback.success_tone();
    }

    fn error_tone(&mut self) {
        self.feedback.error_tone();
    }

    fn beep(&mut self) {
        self.feedback.beep();
    }

    fn service(&mut self, now_ms: u64) {
        self.feedback.service(now_ms);
    }
}

impl<C, S, G, F, D: Display> Display for KioskHardware<C, S, G, F, D> {
    fn show(&mut self, line1: &str, line2: &str) {
        self.display.show(line1, line2);
    }

    fn service(&mut self) {
        self.display.service();
    }
}
