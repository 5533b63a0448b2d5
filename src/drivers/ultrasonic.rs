//! HC-SR04 ultrasonic distance sensor.
//!
//! A 10 µs pulse on TRIG starts a measurement; ECHO then stays high for
//! the round-trip time of the burst.  Both edge waits share one deadline,
//! [`MEASURE_BUDGET_US`] after the trigger, so a poll never holds the
//! control loop longer than that, echo or not.  The budget covers echoes
//! out to roughly a metre; anything farther is reported as no reading,
//! which is never a deposit anyway.
//!
//! ## Dual-target design
//!
//! The microsecond clock is injected: `esp_timer_get_time` on target, a
//! scripted counter in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::error::PeripheralError;

/// Longest a whole measurement may take, trigger to falling edge (µs).
pub const MEASURE_BUDGET_US: u64 = 6_000;

/// Echo microseconds per centimetre of distance (speed of sound, both ways).
pub const US_PER_CM: f32 = 58.0;

pub struct Ultrasonic<TRIG: OutputPin, ECHO: InputPin, D: DelayNs> {
    trig: TRIG,
    echo: ECHO,
    delay: D,
    clock_us: fn() -> u64,
}

impl<TRIG: OutputPin, ECHO: InputPin, D: DelayNs> Ultrasonic<TRIG, ECHO, D> {
    pub fn new(trig: TRIG, echo: ECHO, delay: D, clock_us: fn() -> u64) -> Self {
        Self {
            trig,
            echo,
            delay,
            clock_us,
        }
    }

    /// Distance in centimetres, or NaN when the measurement failed.
    pub fn measure_cm(&mut self) -> f32 {
        match self.echo_us() {
            Ok(us) => us as f32 / US_PER_CM,
            Err(e) => {
                debug!("ultrasonic: {}", e);
                f32::NAN
            }
        }
    }

    fn echo_us(&mut self) -> Result<u64, PeripheralError> {
        self.trig.set_low().map_err(|_| PeripheralError::Bus)?;
        self.delay.delay_us(2);
        self.trig.set_high().map_err(|_| PeripheralError::Bus)?;
        self.delay.delay_us(10);
        self.trig.set_low().map_err(|_| PeripheralError::Bus)?;

        let deadline = (self.clock_us)().saturating_add(MEASURE_BUDGET_US);
        while !self.echo_high()? {
            if (self.clock_us)() >= deadline {
                return Err(PeripheralError::Timeout);
            }
        }

        let rise = (self.clock_us)();
        while self.echo_high()? {
            if (self.clock_us)() >= deadline {
                return Err(PeripheralError::OutOfRange);
            }
        }
        Ok((self.clock_us)().saturating_sub(rise))
    }

    fn echo_high(&mut self) -> Result<bool, PeripheralError> {
        self.echo.is_high().map_err(|_| PeripheralError::Bus)
    }
}
