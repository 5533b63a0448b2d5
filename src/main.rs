//! Eco-RVM Firmware — Main Entry Point
//!
//! Hexagonal architecture around one cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  KioskHardware            HostLink<UartTransport>  LogEventSink│
//! │  (RC522 · HC-SR04 · servo (HostPort)               (EventSink) │
//! │   buzzer/LEDs · LCD1602)                                       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · Timers · Session                                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_hal::uart::UartDriver;
use esp_idf_hal::uart::config::Config as UartConfig;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::sys::ledc_timer_t_LEDC_TIMER_1;
use log::info;

use ecorvm::adapters::hardware::KioskHardware;
use ecorvm::adapters::ledc_tone::LedcTone;
use ecorvm::adapters::log_sink::LogEventSink;
use ecorvm::adapters::time::{MonotonicClock, uptime_us};
use ecorvm::adapters::uart::UartTransport;
use ecorvm::app::service::AppService;
use ecorvm::config::SystemConfig;
use ecorvm::drivers::feedback::{FeedbackDriver, ToneSet};
use ecorvm::drivers::lcd::Lcd1602;
use ecorvm::drivers::rfid::{CardScanner, Mfrc522};
use ecorvm::drivers::servo_gate::ServoGate;
use ecorvm::drivers::ultrasonic::Ultrasonic;
use ecorvm::drivers::watchdog::{LoopWatchdog, WATCHDOG_TIMEOUT_MS};
use ecorvm::link::host::HostLink;
use ecorvm::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Eco-RVM v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;
    info!("Config: {}", serde_json::to_string(&config)?);

    let p = Peripherals::take()?;

    // SAFETY (all `Any*Pin::new` below): each GPIO number appears once in
    // the pin map and is claimed exactly once here.

    // ── 2. Card reader (SPI2) ─────────────────────────────────
    let mut rfid_rst = PinDriver::output(unsafe { AnyOutputPin::new(pins::RFID_RST_GPIO) })?;
    rfid_rst.set_high()?;
    let spi = SpiDriver::new(
        p.spi2,
        unsafe { AnyOutputPin::new(pins::RFID_SCLK_GPIO) },
        unsafe { AnyOutputPin::new(pins::RFID_MOSI_GPIO) },
        Some(unsafe { AnyInputPin::new(pins::RFID_MISO_GPIO) }),
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(unsafe { AnyOutputPin::new(pins::RFID_SS_GPIO) }),
        &SpiConfig::new().baudrate(Hertz(pins::RFID_SPI_HZ)),
    )?;
    let mut rfid = Mfrc522::new(spi);
    rfid.init(&mut FreeRtos)?;

    // ── 3. Ultrasonic sensor ──────────────────────────────────
    let trig = PinDriver::output(unsafe { AnyOutputPin::new(pins::ULTRASONIC_TRIG_GPIO) })?;
    let echo = PinDriver::input(unsafe { AnyInputPin::new(pins::ULTRASONIC_ECHO_GPIO) })?;
    let ultrasonic = Ultrasonic::new(trig, echo, Ets, uptime_us);

    // ── 4. Gate servo (LEDC timer 0, 50 Hz) ───────────────────
    let servo_timer = LedcTimerDriver::new(
        p.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(pins::SERVO_PWM_FREQ_HZ))
            .resolution(Resolution::Bits14),
    )?;
    let servo = LedcDriver::new(
        p.ledc.channel0,
        &servo_timer,
        unsafe { AnyOutputPin::new(pins::SERVO_GPIO) },
    )?;
    let gate = ServoGate::new(servo, config.servo_closed_angle_deg, config.servo_open_angle_deg);

    // ── 5. Buzzer (LEDC timer 1) + LEDs ───────────────────────
    let buzzer_timer = LedcTimerDriver::new(
        p.ledc.timer1,
        &TimerConfig::new()
            .frequency(Hertz(config.beep_tone.freq_hz))
            .resolution(Resolution::Bits10),
    )?;
    let buzzer = LedcDriver::new(
        p.ledc.channel1,
        &buzzer_timer,
        unsafe { AnyOutputPin::new(pins::BUZZER_GPIO) },
    )?;
    let feedback = FeedbackDriver::new(
        LedcTone::new(buzzer, ledc_timer_t_LEDC_TIMER_1),
        PinDriver::output(unsafe { AnyOutputPin::new(pins::LED_GREEN_GPIO) })?,
        PinDriver::output(unsafe { AnyOutputPin::new(pins::LED_RED_GPIO) })?,
        ToneSet {
            success: config.success_tone,
            error: config.error_tone,
            beep: config.beep_tone,
        },
    );

    // ── 6. LCD (I2C0) ─────────────────────────────────────────
    let i2c = I2cDriver::new(
        p.i2c0,
        unsafe { AnyIOPin::new(pins::I2C_SDA_GPIO) },
        unsafe { AnyIOPin::new(pins::I2C_SCL_GPIO) },
        &I2cConfig::new().baudrate(Hertz(pins::I2C_HZ)),
    )?;
    let mut lcd = Lcd1602::new(i2c, Ets, pins::LCD_I2C_ADDRESS);
    lcd.init()?;

    let mut hw = KioskHardware::new(CardScanner::new(rfid), ultrasonic, gate, feedback, lcd);

    // ── 7. Host link (UART1) ──────────────────────────────────
    let uart = UartDriver::new(
        p.uart1,
        unsafe { AnyIOPin::new(pins::HOST_UART_TX_GPIO) },
        unsafe { AnyIOPin::new(pins::HOST_UART_RX_GPIO) },
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(config.serial_baudrate)),
    )?;
    let mut host = HostLink::new(UartTransport::new(uart));

    // ── 8. App service ────────────────────────────────────────
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let loop_ms = config.control_loop_interval_ms;
    let status_every_ms = u64::from(config.status_report_interval_secs) * 1000;

    let mut app = AppService::new(config)?;
    app.start(clock.now_ms(), &mut hw, &mut sink);
    let watchdog = LoopWatchdog::subscribe(WATCHDOG_TIMEOUT_MS);

    info!("System ready. Entering control loop.");

    // ── 9. Control loop ───────────────────────────────────────
    let mut last_status_ms = clock.now_ms();
    loop {
        let now = clock.now_ms();
        app.tick(now, &mut hw, &mut host, &mut sink);

        if status_every_ms > 0 && now.saturating_sub(last_status_ms) >= status_every_ms {
            app.report_status(&mut sink);
            last_status_ms = now;
        }

        watchdog.feed();
        FreeRtos::delay_ms(loop_ms);
    }
}
