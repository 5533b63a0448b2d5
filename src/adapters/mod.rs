//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                      | Connects to            |
//! |-------------|---------------------------------|------------------------|
//! | `hardware`  | CardReader, ProximitySensor,    | RC522, HC-SR04, servo, |
//! |             | Gate, Feedback, Display         | buzzer/LEDs, LCD1602   |
//! | `log_sink`  | EventSink                       | Serial log output      |
//! | `time`      | —                               | ESP32 system timer     |
//! | `uart`      | Transport                       | UART1 to the host PC   |
//! | `ledc_tone` | TonePwm                         | LEDC buzzer channel    |

pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod ledc_tone;
pub mod log_sink;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
