//! Application core — pure session logic, zero direct I/O.
//!
//! This module contains the business rules for the kiosk: session FSM
//! orchestration, tick ordering, and session bookkeeping.  All interaction
//! with hardware and the host happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
