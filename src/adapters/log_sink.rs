//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Status reports are rendered as one JSON line so a maintenance console
//! can scrape them.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::SessionStarted { user_id } => {
                info!("SESSION | start | user={}", user_id);
            }
            AppEvent::SessionEnded(summary) => {
                info!(
                    "SESSION | end | user={} | outcome={:?} | points={}",
                    summary.user_id, summary.outcome, summary.points
                );
            }
            AppEvent::LinkFault(e) => {
                warn!("LINK | inbound dropped: {}", e);
            }
            AppEvent::HostSendFailed(e) => {
                warn!("LINK | send failed: {}", e);
            }
            AppEvent::Status(report) => match serde_json::to_string(report) {
                Ok(json) => info!("STATUS | {}", json),
                Err(e) => warn!("STATUS | serialise failed: {}", e),
            },
        }
    }
}
