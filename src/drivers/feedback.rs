//! Buzzer + status LEDs.
//!
//! Tones start immediately and are stopped from [`FeedbackDriver::service`]
//! once their duration has passed, so a tone never blocks the loop.  The
//! green LED accompanies the success tone, the red LED the error tone;
//! both go dark when the tone ends.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::config::Tone;
use crate::error::PeripheralError;

/// A square-wave tone generator (LEDC channel on target).
pub trait TonePwm {
    fn start(&mut self, freq_hz: u32) -> Result<(), PeripheralError>;
    fn stop(&mut self) -> Result<(), PeripheralError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playing {
    Silent,
    /// Started; the deadline is fixed on the next `service` call.
    Started { duration_ms: u32 },
    Until(u64),
}

/// Tone set used by the three feedback cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneSet {
    pub success: Tone,
    pub error: Tone,
    pub beep: Tone,
}

pub struct FeedbackDriver<B: TonePwm, G: OutputPin, R: OutputPin> {
    buzzer: B,
    green: G,
    red: R,
    tones: ToneSet,
    playing: Playing,
}

impl<B: TonePwm, G: OutputPin, R: OutputPin> FeedbackDriver<B, G, R> {
    pub fn new(buzzer: B, green: G, red: R, tones: ToneSet) -> Self {
        Self {
            buzzer,
            green,
            red,
            tones,
            playing: Playing::Silent,
        }
    }

    pub fn success(&mut self) -> Result<(), PeripheralError> {
        self.leds(true, false)?;
        self.play(self.tones.success)
    }

    pub fn error(&mut self) -> Result<(), PeripheralError> {
        self.leds(false, true)?;
        self.play(self.tones.error)
    }

    pub fn beep(&mut self) -> Result<(), PeripheralError> {
        self.play(self.tones.beep)
    }

    pub fn is_playing(&self) -> bool {
        self.playing != Playing::Silent
    }

    /// End the current tone once its duration has elapsed.
    pub fn service(&mut self, now_ms: u64) -> Result<(), PeripheralError> {
        match self.playing {
            Playing::Silent => Ok(()),
            Playing::Started { duration_ms } => {
                self.playing = Playing::Until(now_ms + u64::from(duration_ms));
                Ok(())
            }
            Playing::Until(end) if now_ms >= end => {
                self.playing = Playing::Silent;
                self.buzzer.stop()?;
                self.leds(false, false)
            }
            Playing::Until(_) => Ok(()),
        }
    }

    fn play(&mut self, tone: Tone) -> Result<(), PeripheralError> {
        debug!("tone {} Hz for {} ms", tone.freq_hz, tone.duration_ms);
        self.buzzer.start(tone.freq_hz)?;
        self.playing = Playing::Started {
            duration_ms: tone.duration_ms,
        };
        Ok(())
    }

    fn leds(&mut self, green: bool, red: bool) -> Result<(), PeripheralError> {
        set(&mut self.green, green)?;
        set(&mut self.red, red)
    }
}

fn set(pin: &mut impl OutputPin, high: bool) -> Result<(), PeripheralError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| PeripheralError::Bus)
}
