//! Mock hardware and a tick-driven kiosk harness for integration tests.
//!
//! Records every peripheral call so tests can assert on the full command
//! history without touching real GPIO/PWM registers.  The host side is
//! the real `HostLink` over an in-memory transport, so the line codec is
//! exercised end to end.

#![allow(dead_code)]

use std::collections::VecDeque;

use ecorvm::app::events::AppEvent;
use ecorvm::app::ports::{CardReader, Display, EventSink, Feedback, Gate, ProximitySensor};
use ecorvm::app::service::AppService;
use ecorvm::config::SystemConfig;
use ecorvm::fsm::StateId;
use ecorvm::link::UserId;
use ecorvm::link::host::HostLink;
use ecorvm::link::transport::MemoryTransport;

// ── Peripheral call record ────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    /// A logical gate movement (repeats of the current position are not actuations).
    GateOpen,
    GateClose,
    Show(String, String),
    SuccessTone,
    ErrorTone,
    Beep,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Card reads returned by successive polls (`None` = empty field).
    pub cards: VecDeque<Option<String>>,
    /// Distance returned by every proximity poll.
    pub distance_cm: f32,
    pub card_polls: u32,
    pub proximity_polls: u32,
    gate_open: Option<bool>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            cards: VecDeque::new(),
            distance_cm: 120.0,
            card_polls: 0,
            proximity_polls: 0,
            gate_open: None,
        }
    }

    pub fn present_card(&mut self, id: &str) {
        self.cards.push_back(Some(id.to_owned()));
    }

    pub fn gate_is_open(&self) -> bool {
        self.gate_open == Some(true)
    }

    pub fn gate_actuations(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HwCall::GateOpen | HwCall::GateClose))
            .count()
    }

    pub fn last_screen(&self) -> Option<(String, String)> {
        self.calls.iter().rev().find_map(|c| match c {
            HwCall::Show(l1, l2) => Some((l1.clone(), l2.clone())),
            _ => None,
        })
    }

    pub fn count(&self, call: &HwCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl CardReader for MockHardware {
    fn try_read(&mut self) -> Option<UserId> {
        self.card_polls += 1;
        let id = self.cards.pop_front().flatten()?;
        let mut uid = UserId::new();
        uid.push_str(&id).ok()?;
        Some(uid)
    }
}

impl ProximitySensor for MockHardware {
    fn distance_cm(&mut self) -> f32 {
        self.proximity_polls += 1;
        self.distance_cm
    }
}

impl Gate for MockHardware {
    fn open(&mut self) {
        if self.gate_open != Some(true) {
            self.gate_open = Some(true);
            self.calls.push(HwCall::GateOpen);
        }
    }

    fn close(&mut self) {
        if self.gate_open != Some(false) {
            self.gate_open = Some(false);
            self.calls.push(HwCall::GateClose);
        }
    }

    fn is_open(&self) -> bool {
        self.gate_is_open()
    }
}

impl Feedback for MockHardware {
    fn success_tone(&mut self) {
        self.calls.push(HwCall::SuccessTone);
    }

    fn error_tone(&mut self) {
        self.calls.push(HwCall::ErrorTone);
    }

    fn beep(&mut self) {
        self.calls.push(HwCall::Beep);
    }
}

impl Display for MockHardware {
    fn show(&mut self, line1: &str, line2: &str) {
        self.calls
            .push(HwCall::Show(line1.to_owned(), line2.to_owned()));
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Kiosk harness ─────────────────────────────────────────────

/// Loop period used by [`Kiosk::run_for`].
pub const TICK_MS: u64 = 10;

pub struct Kiosk {
    pub app: AppService,
    pub hw: MockHardware,
    pub host: HostLink<MemoryTransport>,
    pub sink: RecordingSink,
    pub now_ms: u64,
}

impl Kiosk {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        let mut kiosk = Self {
            app: AppService::new(config).expect("valid config"),
            hw: MockHardware::new(),
            host: HostLink::new(MemoryTransport::new()),
            sink: RecordingSink::new(),
            now_ms: 0,
        };
        kiosk.app.start(0, &mut kiosk.hw, &mut kiosk.sink);
        kiosk
    }

    /// One control-loop pass at the current time.
    pub fn tick(&mut self) {
        self.app
            .tick(self.now_ms, &mut self.hw, &mut self.host, &mut self.sink);
    }

    /// Advance the clock by `ms` and tick once.
    pub fn tick_after(&mut self, ms: u64) {
        self.now_ms += ms;
        self.tick();
    }

    /// Tick every [`TICK_MS`] for `ms` milliseconds.
    pub fn run_for(&mut self, ms: u64) {
        let end = self.now_ms + ms;
        while self.now_ms < end {
            self.tick_after(TICK_MS);
        }
    }

    /// Tick until `state` is reached, giving up after `limit_ms`.
    pub fn run_until(&mut self, state: StateId, limit_ms: u64) -> bool {
        let end = self.now_ms + limit_ms;
        while self.now_ms < end {
            if self.app.state() == state {
                return true;
            }
            self.tick_after(TICK_MS);
        }
        self.app.state() == state
    }

    /// Queue one host line (newline appended).
    pub fn host_says(&mut self, line: &str) {
        let transport = self.host.transport_mut();
        transport.inject(line.as_bytes());
        transport.inject(b"\n");
    }

    /// Lines the kiosk has sent to the host so far.
    pub fn sent(&mut self) -> Vec<String> {
        self.host.transport_mut().sent_lines()
    }

    pub fn state(&self) -> StateId {
        self.app.state()
    }

    /// Drive a card through authentication to `AwaitingObject`.
    pub fn authenticate(&mut self, id: &str) {
        self.hw.present_card(id);
        assert!(self.run_until(StateId::Authenticating, 200));
        self.host_says("READY");
        self.tick_after(TICK_MS);
        assert_eq!(self.state(), StateId::AwaitingObject);
    }

    /// From `AwaitingObject`, put an object in front of the sensor.
    pub fn deposit(&mut self) {
        self.hw.distance_cm = 10.0;
        assert!(self.run_until(StateId::Analyzing, 200));
        self.hw.distance_cm = 120.0;
    }
}

impl Default for Kiosk {
    fn default() -> Self {
        Self::new()
    }
}
