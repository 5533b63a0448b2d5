//! Peripheral drivers, generic over `embedded-hal` 1.0 traits.
//!
//! None of these know about sessions; the hardware adapter wraps them
//! behind the port traits.

pub mod feedback;
pub mod lcd;
pub mod rfid;
pub mod servo_gate;
pub mod ultrasonic;
pub mod watchdog;
