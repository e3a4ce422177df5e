//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use tickwork::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Frame vocabulary
pub use crate::core::time::{FrameTime, Phase};

// Update dispatch
pub use crate::core::dispatch::{PhaseReport, PostStep, PreStep, Step, UpdateDispatcher};

// Object pooling
pub use crate::core::pool::{
    Growth, InstanceState, ObjectPool, PoolError, PoolHandle, PoolInstance, PoolKey,
    PoolListener, PoolTemplate, Poolable,
};

// State machines
pub use crate::core::fsm::{
    MachineId, State, StateContext, StateId, StateMachine, TransitionError,
};

// Frame loop
pub use crate::runtime::{FrameLoop, FrameLoopBuilder, HostSignal};
