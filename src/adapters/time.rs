//! Monotonic time source.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.
//!
//! Session deadlines are computed on this clock only; wall-clock time is
//! never consulted.

/// Microseconds since boot.  A plain `fn` so drivers can hold it as a
/// clock without borrowing the adapter.
#[cfg(target_os = "espidf")]
pub fn uptime_us() -> u64 {
    // SAFETY: reads a free-running hardware counter; no shared state.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

/// Microseconds since the first call.
#[cfg(not(target_os = "espidf"))]
pub fn uptime_us() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START.get_or_init(std::time::Instant::now).elapsed().as_micros() as u64
}

/// Millisecond clock handed to the control loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }

    /// Milliseconds since boot (monotonic).
    pub fn now_ms(&self) -> u64 {
        uptime_us() / 1_000
    }
}
