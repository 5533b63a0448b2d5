//! Buzzer tone generator on an LEDC channel (ESP-IDF only).
//!
//! The channel's timer is dedicated to the buzzer, so changing its
//! frequency per tone does not disturb the servo timer.

use esp_idf_hal::ledc::LedcDriver;
use esp_idf_svc::sys::{ESP_OK, ledc_mode_t_LEDC_LOW_SPEED_MODE, ledc_set_freq, ledc_timer_t};
use log::warn;

use crate::drivers::feedback::TonePwm;
use crate::error::PeripheralError;

pub struct LedcTone<'d> {
    channel: LedcDriver<'d>,
    timer: ledc_timer_t,
}

impl<'d> LedcTone<'d> {
    pub fn new(channel: LedcDriver<'d>, timer: ledc_timer_t) -> Self {
        Self { channel, timer }
    }
}

impl TonePwm for LedcTone<'_> {
    fn start(&mut self, freq_hz: u32) -> Result<(), PeripheralError> {
        // SAFETY: the timer was configured by `LedcTimerDriver` and is
        // used by this channel alone.
        let rc = unsafe { ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, self.timer, freq_hz) };
        if rc != ESP_OK as i32 {
            warn!("ledc_set_freq({}) failed: rc={}", freq_hz, rc);
            return Err(PeripheralError::Bus);
        }
        let half = self.channel.get_max_duty() / 2;
        self.channel.set_duty(half).map_err(|_| PeripheralError::Bus)
    }

    fn stop(&mut self) -> Result<(), PeripheralError> {
        self.channel.set_duty(0).map_err(|_| PeripheralError::Bus)
    }
}
