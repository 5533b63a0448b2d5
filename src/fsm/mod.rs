//! Function-pointer finite state machine engine for the kiosk session.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                            │
//! │  ┌────────────────┬───────────┬──────────┬──────────┬──────────────┐   │
//! │  │ StateId         │ polls     │ on_enter │ on_exit  │ on_update    │   │
//! │  │                 │           │          │          │ on_expire    │   │
//! │  ├────────────────┼───────────┼──────────┼──────────┼──────────────┤   │
//! │  │ Idle            │ card      │ fn(ctx)  │ —        │ fn(ctx)      │   │
//! │  │ Authenticating  │ —         │ fn(ctx)  │ —        │ fn(ctx)      │   │
//! │  │ AwaitingObject  │ proximity │ fn(ctx)  │ —        │ fn(ctx)      │   │
//! │  │ Analyzing       │ —         │ fn(ctx)  │ —        │ fn(ctx)      │   │
//! │  │ Dispensing      │ —         │ fn(ctx)  │ fn(ctx)  │ fn(ctx)      │   │
//! │  │ Rejected        │ —         │ fn(ctx)  │ —        │ fn(ctx)      │   │
//! │  └────────────────┴───────────┴──────────┴──────────┴──────────────┘   │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine first checks the session timers.  If one is due,
//! the current state's `on_expire` decides the next state; otherwise its
//! `on_update` sees this tick's inputs.  Either way at most one transition
//! happens per tick.  A transition runs `on_exit`, disarms every timer,
//! then runs `on_enter` for the next state.

pub mod context;
pub mod states;
pub mod timer;

use context::FsmContext;
use log::{info, warn};
use timer::TimerKind;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all session states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Authenticating = 1,
    AwaitingObject = 2,
    Analyzing = 3,
    Dispensing = 4,
    Rejected = 5,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 6;

    pub const ALL: [StateId; StateId::COUNT] = [
        Self::Idle,
        Self::Authenticating,
        Self::AwaitingObject,
        Self::Analyzing,
        Self::Dispensing,
        Self::Rejected,
    ];

    /// Convert a table index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Authenticating,
            2 => Self::AwaitingObject,
            3 => Self::Analyzing,
            4 => Self::Dispensing,
            5 => Self::Rejected,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Authenticating => "Authenticating",
            Self::AwaitingObject => "AwaitingObject",
            Self::Analyzing => "Analyzing",
            Self::Dispensing => "Dispensing",
            Self::Rejected => "Rejected",
        }
    }
}

/// The peripheral a state reads.  Exactly one owner per peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Nothing,
    CardReader,
    Proximity,
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

/// Signature for the timer-expiry handler.
pub type StateExpireFn = fn(&mut FsmContext, TimerKind) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub polls: Poll,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
    pub on_expire: Option<StateExpireFn>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the mutable
/// [`FsmContext`] is threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        ctx.session.state = self.current_state();
        ctx.session.state_entered_at_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.  Returns `true` if it transitioned.
    ///
    /// 1. If a timer is due, call `on_expire` for the current state;
    ///    otherwise call `on_update`.
    /// 2. If the handler returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → disarm timers → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) -> bool {
        self.tick_count += 1;
        let row = &self.table[self.current];

        let next = match ctx.timers.expired(ctx.now_ms) {
            Some(kind) => match row.on_expire {
                Some(expire) => expire(ctx, kind),
                None => {
                    warn!("FSM: {:?} expired in {} with no handler", kind, row.name);
                    ctx.timers.disarm(kind);
                    None
                }
            },
            None => (row.on_update)(ctx),
        };

        match next {
            Some(next_id) => {
                self.transition(next_id, ctx);
                true
            }
            None => false,
        }
    }

    /// Force an immediate transition regardless of inputs or timers.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    /// Which peripheral the current state reads.
    pub fn current_polls(&self) -> Poll {
        self.table[self.current].polls
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {} (after {} ticks)",
            self.table[self.current].name,
            self.table[next_idx].name,
            self.ticks_in_current_state()
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // No timer outlives the state that armed it.
        ctx.timers.disarm_all();

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.session.state = next_id;
        ctx.session.state_entered_at_ms = ctx.now_ms;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
