//=========================================================================
// State Machine
//=========================================================================
//
// Flat state machine: one exclusive current state among sibling states.
//
// Architecture:
//   StateMachine
//     ├─ states: Vec<Box<dyn State>>   (stamped with StateId at add_state)
//     └─ current: Option<StateId>
//
// Flow:
//   change_state(next) ──> validate owner ──> on_exit(current)
//                                         ──> current = next
//                                         ──> on_enter(next)
//
//   run_phase(phase) ──> on_execute / on_physics_execute / on_post_execute
//
// States ask for transitions through `StateContext::change_state`. The
// request is honored only if the asking state is still current once its
// hook returns.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicU64, Ordering};

//=== Internal Dependencies ===============================================

use crate::core::time::FrameTime;

//=== Module Declarations =================================================

mod error;
mod state_machine;

//=== Public API ==========================================================

pub use error::TransitionError;
pub use state_machine::StateMachine;

//=== Identifiers =========================================================

/// Identity of a [`StateMachine`], unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachineId(u64);

impl MachineId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MachineId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a state inside a specific machine.
///
/// Only [`StateMachine::add_state`] creates these, so the owning machine
/// is fixed at composition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId {
    machine: MachineId,
    index: usize,
}

impl StateId {
    /// Machine that owns this state.
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    /// Position of the state in composition order.
    pub fn index(&self) -> usize {
        self.index
    }
}

//=== StateContext ========================================================

/// Per-hook context handed to [`State`] callbacks.
pub struct StateContext<'a> {
    time: &'a FrameTime,
    this: StateId,
    request: Option<Option<StateId>>,
}

impl<'a> StateContext<'a> {
    pub(crate) fn new(time: &'a FrameTime, this: StateId) -> Self {
        Self {
            time,
            this,
            request: None,
        }
    }

    /// Timing of the frame the hook runs in.
    pub fn time(&self) -> &FrameTime {
        self.time
    }

    /// The state whose hook is running.
    pub fn this_state(&self) -> StateId {
        self.this
    }

    /// Asks the machine to move to `next` (`None` stops the machine).
    ///
    /// Applied after the hook returns, and only if this state is still the
    /// current one. The last request made during a hook wins.
    pub fn change_state(&mut self, next: Option<StateId>) {
        self.request = Some(next);
    }

    pub(crate) fn into_request(self) -> Option<Option<StateId>> {
        self.request
    }
}

//=== State Trait =========================================================

/// Behavior of one state.
///
/// All hooks default to doing nothing.
///
/// ```rust
/// # use tickwork::prelude::*;
/// struct Countdown { left: f64, next: Option<StateId> }
///
/// impl State for Countdown {
///     fn on_execute(&mut self, ctx: &mut StateContext<'_>) {
///         self.left -= ctx.time().delta;
///         if self.left <= 0.0 {
///             ctx.change_state(self.next);
///         }
///     }
/// }
/// ```
pub trait State {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called when the state becomes current.
    fn on_enter(&mut self, _ctx: &mut StateContext<'_>) {}

    /// Called during the pre-physics phase while current.
    fn on_execute(&mut self, _ctx: &mut StateContext<'_>) {}

    /// Called during the physics phase while current.
    fn on_physics_execute(&mut self, _ctx: &mut StateContext<'_>) {}

    /// Called during the post-physics phase while current.
    fn on_post_execute(&mut self, _ctx: &mut StateContext<'_>) {}

    /// Called when the state stops being current.
    fn on_exit(&mut self, _ctx: &mut StateContext<'_>) {}
}
