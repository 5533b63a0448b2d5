//! Deposit gate hobby servo (SG90 class) on a 50 Hz PWM channel.
//!
//! Pulse width maps linearly from 500 µs at 0° to 2500 µs at 180°.
//! Open and close are idempotent: the PWM channel is only written when the
//! commanded position differs from the last one, so the gate level can be
//! re-asserted every control tick without jitter.

use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::error::PeripheralError;

/// 50 Hz frame.
pub const FRAME_US: u16 = 20_000;
pub const MIN_PULSE_US: u16 = 500;
pub const MAX_PULSE_US: u16 = 2_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePosition {
    Closed,
    Open,
}

pub struct ServoGate<P: SetDutyCycle> {
    pwm: P,
    open_deg: u8,
    closed_deg: u8,
    /// `None` until the first command, so the first close always drives.
    position: Option<GatePosition>,
}

impl<P: SetDutyCycle> ServoGate<P> {
    pub fn new(pwm: P, closed_deg: u8, open_deg: u8) -> Self {
        Self {
            pwm,
            open_deg,
            closed_deg,
            position: None,
        }
    }

    pub fn open(&mut self) -> Result<(), PeripheralError> {
        self.move_to(GatePosition::Open)
    }

    pub fn close(&mut self) -> Result<(), PeripheralError> {
        self.move_to(GatePosition::Closed)
    }

    pub fn position(&self) -> Option<GatePosition> {
        self.position
    }

    fn move_to(&mut self, target: GatePosition) -> Result<(), PeripheralError> {
        if self.position == Some(target) {
            return Ok(());
        }
        let angle = match target {
            GatePosition::Open => self.open_deg,
            GatePosition::Closed => self.closed_deg,
        };
        self.pwm
            .set_duty_cycle_fraction(pulse_us(angle), FRAME_US)
            .map_err(|_| PeripheralError::Bus)?;
        self.position = Some(target);
        info!("Gate {:?} ({}°)", target, angle);
        Ok(())
    }
}

/// Servo pulse width for `angle` degrees (clamped to 180).
pub fn pulse_us(angle: u8) -> u16 {
    let span = u32::from(MAX_PULSE_US - MIN_PULSE_US);
    let offset = u32::from(angle.min(180)) * span / 180;
    // offset <= span, so the sum stays within MAX_PULSE_US.
    MIN_PULSE_US + offset as u16
}
