//! GPIO / peripheral pin assignments for the Eco-RVM controller board.
//!
//! Single source of truth — `main` claims every pin from this module
//! rather than hard-coding numbers.

// ---------------------------------------------------------------------------
// RC522 card reader (SPI2)
// ---------------------------------------------------------------------------

/// SPI chip select (SDA/SS on the RC522 module).
pub const RFID_SS_GPIO: i32 = 10;
/// Active-low hard reset.
pub const RFID_RST_GPIO: i32 = 9;
pub const RFID_SCLK_GPIO: i32 = 12;
pub const RFID_MOSI_GPIO: i32 = 11;
pub const RFID_MISO_GPIO: i32 = 13;
/// SPI clock; the RC522 tolerates up to 10 MHz.
pub const RFID_SPI_HZ: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// HC-SR04 ultrasonic sensor
// ---------------------------------------------------------------------------

pub const ULTRASONIC_TRIG_GPIO: i32 = 7;
/// Echo is a 5 V signal; routed through a divider to this input.
pub const ULTRASONIC_ECHO_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Gate servo
// ---------------------------------------------------------------------------

/// LEDC PWM output for the gate servo.
pub const SERVO_GPIO: i32 = 4;
/// Hobby servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

pub const LED_GREEN_GPIO: i32 = 2;
pub const LED_RED_GPIO: i32 = 3;
/// Passive buzzer, LEDC PWM at the tone frequency.
pub const BUZZER_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Character LCD (PCF8574 I²C backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
pub const I2C_HZ: u32 = 100_000;
pub const LCD_I2C_ADDRESS: u8 = 0x27;
pub const LCD_COLS: usize = 16;
pub const LCD_ROWS: usize = 2;

// ---------------------------------------------------------------------------
// Host UART (UART1; UART0 carries the log console)
// ---------------------------------------------------------------------------

pub const HOST_UART_TX_GPIO: i32 = 17;
pub const HOST_UART_RX_GPIO: i32 = 18;
