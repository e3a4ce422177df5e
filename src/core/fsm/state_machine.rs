//=========================================================================
// State Machine
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use log::{debug, error, warn};

//=== Internal Dependencies ===============================================

use super::{MachineId, State, StateContext, StateId, TransitionError};
use crate::core::dispatch::{PostStep, PreStep, Step};
use crate::core::time::{FrameTime, Phase};

//=== Constants ===========================================================

/// Upper bound on transitions applied back-to-back from `on_enter`
/// requests within a single `change_state` call.
const MAX_CHAINED_TRANSITIONS: usize = 32;

#[derive(Debug, Clone, Copy)]
enum Hook {
    Enter,
    Execute(Phase),
    Exit,
}

//=== StateMachine ========================================================

/// Owns a set of sibling states and tracks which one is current.
///
/// # Example
///
/// ```rust
/// # use tickwork::prelude::*;
/// struct Idle;
/// impl State for Idle {}
///
/// let mut machine = StateMachine::new("door");
/// let idle = machine.add_state(Idle);
/// machine.set_initial(Some(idle)).unwrap();
///
/// machine.start().unwrap();
/// assert!(machine.is_current(idle));
/// ```
pub struct StateMachine {
    id: MachineId,
    name: String,
    states: Vec<Box<dyn State>>,
    initial: Option<StateId>,
    current: Option<StateId>,
    time: FrameTime,
    trace: bool,
}

impl StateMachine {
    //--- Construction -----------------------------------------------------

    /// Creates an empty machine with no current state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MachineId::next(),
            name: name.into(),
            states: Vec::new(),
            initial: None,
            current: None,
            time: FrameTime::default(),
            trace: false,
        }
    }

    /// Logs every current-state change at debug level.
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Composes a state into this machine and returns its handle.
    pub fn add_state<S: State + 'static>(&mut self, state: S) -> StateId {
        let id = StateId {
            machine: self.id,
            index: self.states.len(),
        };
        self.states.push(Box::new(state));
        id
    }

    /// Sets the state entered by [`start`](Self::start).
    pub fn set_initial(&mut self, initial: Option<StateId>) -> Result<(), TransitionError> {
        self.validate(initial)?;
        self.initial = initial;
        Ok(())
    }

    //--- Transitions ------------------------------------------------------

    /// Enters the initial state.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.change_state(self.initial)
    }

    /// Exits the current state (if any), then enters `next` (if any).
    ///
    /// A target owned by another machine is rejected and the current state
    /// is left as is.
    pub fn change_state(&mut self, next: Option<StateId>) -> Result<(), TransitionError> {
        self.validate(next)?;
        self.apply(next);
        Ok(())
    }

    /// Transition requested on behalf of `requester`.
    ///
    /// Ignored unless `requester` is the current state. Returns whether the
    /// transition happened.
    pub fn request_change(
        &mut self,
        requester: StateId,
        next: Option<StateId>,
    ) -> Result<bool, TransitionError> {
        if self.current != Some(requester) {
            debug!(
                "{}: ignoring transition request from inactive state {:?}",
                self.name, requester
            );
            return Ok(false);
        }

        self.change_state(next)?;
        Ok(true)
    }

    //--- Dispatch ---------------------------------------------------------

    /// Forwards `phase` to the current state's matching execute hook.
    pub fn run_phase(&mut self, phase: Phase, time: &FrameTime) {
        self.time = *time;

        let Some(current) = self.current else {
            return;
        };

        if let Some(request) = self.invoke(current, Hook::Execute(phase)) {
            if self.current == Some(current) && self.validate(request).is_ok() {
                self.apply(request);
            }
        }
    }

    //--- Query API --------------------------------------------------------

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    pub fn is_current(&self, state: StateId) -> bool {
        self.current == Some(state)
    }

    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    /// Diagnostic name of `state`, or `None` if it belongs elsewhere.
    pub fn state_name(&self, state: StateId) -> Option<&str> {
        if state.machine != self.id {
            return None;
        }
        self.states.get(state.index).map(|s| s.name())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    //--- Internals --------------------------------------------------------

    fn validate(&self, next: Option<StateId>) -> Result<(), TransitionError> {
        match next {
            Some(state) if state.machine != self.id || state.index >= self.states.len() => {
                error!(
                    "{}: not allowed to change to a state that doesn't belong to this state machine",
                    self.name
                );
                Err(TransitionError::ForeignState {
                    machine: self.name.clone(),
                    state,
                })
            }
            _ => Ok(()),
        }
    }

    /// Applies a validated transition plus any request the entering state
    /// made that is still honored afterwards. Requests from `on_exit` are
    /// dropped, even when a state re-enters itself.
    fn apply(&mut self, target: Option<StateId>) {
        let mut pending = Some(target);
        let mut applied = 0;

        while let Some(target) = pending.take() {
            if applied == MAX_CHAINED_TRANSITIONS {
                warn!(
                    "{}: dropped transition after {} chained changes",
                    self.name, MAX_CHAINED_TRANSITIONS
                );
                break;
            }
            applied += 1;

            if let Some(previous) = self.current {
                if self.invoke(previous, Hook::Exit).is_some() {
                    debug!(
                        "{}: ignoring transition request from exiting state {:?}",
                        self.name, previous
                    );
                }
            }

            self.current = target;
            self.trace_current();

            let Some(entered) = target else {
                continue;
            };

            if let Some(request) = self.invoke(entered, Hook::Enter) {
                if self.validate(request).is_ok() {
                    pending = Some(request);
                }
            }
        }
    }

    /// Runs one hook and returns the transition it asked for, if any.
    fn invoke(&mut self, id: StateId, hook: Hook) -> Option<Option<StateId>> {
        let time = self.time;
        let mut ctx = StateContext::new(&time, id);
        let state = self.states.get_mut(id.index)?;

        match hook {
            Hook::Enter => state.on_enter(&mut ctx),
            Hook::Execute(Phase::PreStep) => state.on_execute(&mut ctx),
            Hook::Execute(Phase::Step) => state.on_physics_execute(&mut ctx),
            Hook::Execute(Phase::PostStep) => state.on_post_execute(&mut ctx),
            Hook::Exit => state.on_exit(&mut ctx),
        }

        ctx.into_request()
    }

    fn trace_current(&self) {
        if !self.trace {
            return;
        }
        match self.current.and_then(|id| self.state_name(id)) {
            Some(name) => debug!("{}'s current state is {}", self.name, name),
            None => debug!("{} has no current state", self.name),
        }
    }
}

//=== Phase Subscriptions =================================================

impl PreStep for StateMachine {
    fn pre_step(&mut self, time: &FrameTime) {
        self.run_phase(Phase::PreStep, time);
    }
}

impl Step for StateMachine {
    fn step(&mut self, time: &FrameTime) {
        self.run_phase(Phase::Step, time);
    }
}

impl PostStep for StateMachine {
    fn post_step(&mut self, time: &FrameTime) {
        self.run_phase(Phase::PostStep, time);
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("states", &self.states.len())
            .field("current", &self.current)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
