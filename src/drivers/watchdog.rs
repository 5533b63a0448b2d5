//! Task watchdog (TWDT) guard for the control loop.
//!
//! Every port call is bounded, so a loop iteration that takes longer than
//! the watchdog window means something is wedged; the TWDT then panics
//! and the device reboots into Idle with the gate closed.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure, esp_task_wdt_reset,
};
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

/// Watchdog window for the control loop (ms).
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

pub struct LoopWatchdog {
    subscribed: bool,
}

impl LoopWatchdog {
    /// Subscribe the calling task with a `timeout_ms` window.
    #[cfg(target_os = "espidf")]
    pub fn subscribe(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: called once from the main task during bootstrap.
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret != ESP_OK {
            warn!("TWDT reconfigure returned {} (may already be configured)", ret);
        }

        // SAFETY: a null handle subscribes the current task.
        let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        let subscribed = ret == ESP_OK;
        if subscribed {
            info!("Watchdog: control loop subscribed ({} ms)", timeout_ms);
        } else {
            warn!("Watchdog: failed to subscribe ({})", ret);
        }
        Self { subscribed }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn subscribe(timeout_ms: u32) -> Self {
        info!("Watchdog(sim): {} ms window not enforced", timeout_ms);
        Self { subscribed: false }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Reset the window.  Call once per loop iteration.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: the current task is subscribed.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_watchdog_is_inert() {
        let wd = LoopWatchdog::subscribe(WATCHDOG_TIMEOUT_MS);
        assert!(!wd.is_subscribed());
        wd.feed();
    }
}
