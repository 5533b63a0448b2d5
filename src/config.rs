//! System configuration parameters
//!
//! The kiosk runs on a fixed set of operational constants.  They are
//! collected into [`SystemConfig`] so the state machine and drivers read
//! them from one place, but nothing rewrites them at runtime.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fixed operational constants
// ---------------------------------------------------------------------------

/// Host serial link speed.
pub const SERIAL_BAUDRATE: u32 = 9600;

/// Minimum spacing between two card reader polls (ms).
pub const RFID_READ_DELAY_MS: u32 = 100;

/// An object closer than this (cm) counts as deposited.
pub const OBJECT_DETECT_DISTANCE_CM: f32 = 15.0;

/// How long the gate stays open after an accepted deposit (ms).
pub const GATE_OPEN_TIME_MS: u32 = 3000;

/// Per-phase deadline for the user or the host to respond (ms).
pub const USER_TIMEOUT_MS: u32 = 30_000;

/// Servo angle with the gate shut.
pub const SERVO_CLOSED_ANGLE: u8 = 0;
/// Servo angle with the gate open.
pub const SERVO_OPEN_ANGLE: u8 = 90;

pub const TONE_SUCCESS: Tone = Tone::new(1000, 200);
pub const TONE_ERROR: Tone = Tone::new(400, 500);
pub const TONE_BEEP: Tone = Tone::new(800, 100);

// ---------------------------------------------------------------------------
// Tone
// ---------------------------------------------------------------------------

/// A buzzer tone: square wave at `freq_hz` for `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub freq_hz: u32,
    pub duration_ms: u32,
}

impl Tone {
    pub const fn new(freq_hz: u32, duration_ms: u32) -> Self {
        Self {
            freq_hz,
            duration_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// SystemConfig
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Host link ---
    /// UART baud rate towards the host
    pub serial_baudrate: u32,

    // --- Card reader ---
    /// Card reader poll spacing (milliseconds)
    pub rfid_poll_interval_ms: u32,

    // --- Proximity sensor ---
    /// Deposit detection threshold (centimetres)
    pub object_detect_distance_cm: f32,
    /// Ultrasonic poll spacing (milliseconds); HC-SR04 needs ~60 ms per cycle
    pub proximity_poll_interval_ms: u32,
    /// Readings below this are treated as implausible
    pub sensor_min_distance_cm: f32,
    /// Readings above this are treated as implausible
    pub sensor_max_distance_cm: f32,

    // --- Gate ---
    /// Gate open duration after an accepted deposit (milliseconds)
    pub gate_open_ms: u32,
    pub servo_closed_angle_deg: u8,
    pub servo_open_angle_deg: u8,

    // --- Session ---
    /// Deadline per session phase (milliseconds)
    pub user_timeout_ms: u32,
    /// Rejection screen hold before returning to idle (milliseconds)
    pub rejected_display_ms: u32,
    /// Timeout notice hold before the welcome screen returns (milliseconds)
    pub notice_hold_ms: u32,
    /// Points shown when the host accepts without a point value
    pub points_per_deposit: u16,

    // --- Feedback ---
    pub success_tone: Tone,
    pub error_tone: Tone,
    pub beep_tone: Tone,

    // --- Timing ---
    /// Main loop period (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Status report interval (seconds)
    pub status_report_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Host link
            serial_baudrate: SERIAL_BAUDRATE,

            // Card reader
            rfid_poll_interval_ms: RFID_READ_DELAY_MS,

            // Proximity
            object_detect_distance_cm: OBJECT_DETECT_DISTANCE_CM,
            proximity_poll_interval_ms: 60,
            sensor_min_distance_cm: 2.0,
            sensor_max_distance_cm: 400.0,

            // Gate
            gate_open_ms: GATE_OPEN_TIME_MS,
            servo_closed_angle_deg: SERVO_CLOSED_ANGLE,
            servo_open_angle_deg: SERVO_OPEN_ANGLE,

            // Session
            user_timeout_ms: USER_TIMEOUT_MS,
            rejected_display_ms: GATE_OPEN_TIME_MS,
            notice_hold_ms: 3000,
            points_per_deposit: 10,

            // Feedback
            success_tone: TONE_SUCCESS,
            error_tone: TONE_ERROR,
            beep_tone: TONE_BEEP,

            // Timing
            control_loop_interval_ms: 10, // 100 Hz
            status_report_interval_secs: 60,
        }
    }
}

impl SystemConfig {
    /// Reject parameter sets the state machine cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("user_timeout_ms must be > 0"));
        }
        if self.gate_open_ms == 0 || self.rejected_display_ms == 0 {
            return Err(ConfigError::ValidationFailed("hold durations must be > 0"));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("control loop interval must be > 0"));
        }
        if !(self.sensor_min_distance_cm < self.object_detect_distance_cm
            && self.object_detect_distance_cm <= self.sensor_max_distance_cm)
        {
            return Err(ConfigError::ValidationFailed(
                "detection threshold outside sensor range",
            ));
        }
        if self.servo_open_angle_deg > 180 || self.servo_closed_angle_deg > 180 {
            return Err(ConfigError::ValidationFailed("servo angle above 180 degrees"));
        }
        if self.servo_open_angle_deg == self.servo_closed_angle_deg {
            return Err(ConfigError::ValidationFailed("open and closed angles coincide"));
        }
        for tone in [self.success_tone, self.error_tone, self.beep_tone] {
            if tone.freq_hz == 0 || tone.duration_ms == 0 {
                return Err(ConfigError::ValidationFailed("tone frequency and duration must be > 0"));
            }
        }
        Ok(())
    }
}

/// Errors from [`SystemConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SystemConfig::default().validate(), Ok(()));
    }

    #[test]
    fn defaults_match_hardware_constants() {
        let c = SystemConfig::default();
        assert_eq!(c.rfid_poll_interval_ms, 100);
        assert!((c.object_detect_distance_cm - 15.0).abs() < f32::EPSILON);
        assert_eq!(c.gate_open_ms, 3000);
        assert_eq!(c.user_timeout_ms, 30_000);
        assert_eq!((c.servo_closed_angle_deg, c.servo_open_angle_deg), (0, 90));
        assert_eq!(c.success_tone, Tone::new(1000, 200));
        assert_eq!(c.error_tone, Tone::new(400, 500));
        assert_eq!(c.beep_tone, Tone::new(800, 100));
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.user_timeout_ms, c2.user_timeout_ms);
        assert_eq!(c.success_tone, c2.success_tone);
        assert!((c.object_detect_distance_cm - c2.object_detect_distance_cm).abs() < 0.001);
    }

    #[test]
    fn zero_timeout_rejected() {
        let c = SystemConfig {
            user_timeout_ms: 0,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn threshold_outside_sensor_range_rejected() {
        let c = SystemConfig {
            object_detect_distance_cm: 1.0,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn coinciding_servo_angles_rejected() {
        let c = SystemConfig {
            servo_open_angle_deg: 0,
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn silent_tone_rejected() {
        let c = SystemConfig {
            beep_tone: Tone::new(0, 100),
            ..SystemConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.control_loop_interval_ms < c.rfid_poll_interval_ms,
            "control loop should tick faster than the card reader is polled"
        );
        assert!(c.gate_open_ms < c.user_timeout_ms);
    }
}
